use super::telemetry_record::{TELEMETRY_HEADER, TelemetryRecord};
use crate::{event, info};
use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};
use strum_macros::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryError {
    Open(io::ErrorKind),
    Write(io::ErrorKind),
    Sync(io::ErrorKind),
}

impl std::error::Error for TelemetryError {}

/// Append-only, synchronously durable CSV recorder.
///
/// Every `append` returns only after the line reached stable storage. Existing content is never
/// truncated or rewritten: reopening an existing file continues after its last line.
#[derive(Debug)]
pub struct TelemetryLogger {
    file: File,
    path: PathBuf,
    records: u64,
}

impl TelemetryLogger {
    /// Opens `path` for appending. A newly created file gets the header line first.
    pub fn open<T: AsRef<Path>>(path: T) -> Result<Self, TelemetryError> {
        let path = path.as_ref().to_path_buf();
        let created = OpenOptions::new().append(true).create_new(true).open(&path);
        let mut logger = match created {
            Ok(file) => Self { file, path, records: 0 },
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let file = OpenOptions::new()
                    .append(true)
                    .open(&path)
                    .map_err(|e| TelemetryError::Open(e.kind()))?;
                return Ok(Self { file, path, records: 0 });
            }
            Err(e) => return Err(TelemetryError::Open(e.kind())),
        };
        logger.write_durable(TELEMETRY_HEADER)?;
        // persist the directory entry of the new file as well
        if let Some(dir) = logger.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Err(e) = sync_dir(dir) {
                event!("Directory sync of {} failed ({e})", dir.display());
            }
        }
        Ok(logger)
    }

    /// Creates `dir` if needed and opens a fresh `mission_<unix seconds>.csv` inside it.
    pub fn open_in_dir<T: AsRef<Path>>(dir: T) -> Result<Self, TelemetryError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| TelemetryError::Open(e.kind()))?;
        let name = format!("mission_{}.csv", chrono::Utc::now().timestamp());
        let logger = Self::open(dir.join(name))?;
        info!("Recording telemetry to {}", logger.path.display());
        Ok(logger)
    }

    pub fn path(&self) -> &Path { &self.path }
    /// Records appended through this handle.
    pub fn records(&self) -> u64 { self.records }

    pub fn append(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        self.write_durable(&record.to_csv_line())?;
        self.records += 1;
        Ok(())
    }

    /// Appends a `#` comment line, e.g. to mark mission events between records.
    pub fn append_marker(&mut self, text: &str) -> Result<(), TelemetryError> {
        self.write_durable(&format!("# {text}"))
    }

    fn write_durable(&mut self, line: &str) -> Result<(), TelemetryError> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        self.file.write_all(buf.as_bytes()).map_err(|e| TelemetryError::Write(e.kind()))?;
        self.file.flush().map_err(|e| TelemetryError::Write(e.kind()))?;
        self.file.sync_data().map_err(|e| TelemetryError::Sync(e.kind()))
    }
}

/// Persists the directory entries of `dir`.
pub(super) fn sync_dir(dir: &Path) -> io::Result<()> { File::open(dir)?.sync_all() }
