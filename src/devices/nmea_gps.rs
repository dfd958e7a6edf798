use super::{GpsFix, PositionSensor, SensorError, nmea::parse_gga};
use async_trait::async_trait;
use std::{
    fs::File,
    io::{self, Read},
    os::{
        fd::{AsRawFd, RawFd},
        unix::fs::OpenOptionsExt,
    },
    path::Path,
    pin::Pin,
    task::{Context, Poll, ready},
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader, Interest, ReadBuf, unix::AsyncFd},
    time::{Instant, timeout_at},
};

/// Non-blocking read end of a serial device, registered with the tokio reactor.
/// Line settings (baud rate, raw mode) are expected to be configured outside this process.
pub struct SerialPort {
    inner: AsyncFd<File>,
}

impl SerialPort {
    pub fn open<T: AsRef<Path>>(path: T) -> io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY)
            .open(path)?;
        Ok(Self { inner: AsyncFd::with_interest(file, Interest::READABLE)? })
    }
}

impl AsRawFd for SerialPort {
    fn as_raw_fd(&self) -> RawFd { self.inner.get_ref().as_raw_fd() }
}

impl AsyncRead for SerialPort {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        loop {
            let mut guard = ready!(self.inner.poll_read_ready(cx))?;
            let unfilled = buf.initialize_unfilled();
            match guard.try_io(|inner| inner.get_ref().read(unfilled)) {
                Ok(Ok(len)) => {
                    buf.advance(len);
                    return Poll::Ready(Ok(()));
                }
                Ok(Err(e)) => return Poll::Ready(Err(e)),
                Err(_would_block) => {}
            }
        }
    }
}

/// Position sensor reading `GGA` sentences from a line-oriented NMEA stream.
///
/// Every read first throws away whatever is already buffered, so the returned fix is never older
/// than the read itself, then scans lines until a `GGA` sentence with a fix arrives or the scan
/// timeout ends.
pub struct NmeaGpsReceiver<R> {
    reader: BufReader<R>,
    scan_timeout: Duration,
    tty_fd: Option<RawFd>,
}

impl NmeaGpsReceiver<SerialPort> {
    pub fn open<T: AsRef<Path>>(path: T, scan_timeout: Duration) -> io::Result<Self> {
        let port = SerialPort::open(path)?;
        let tty_fd = Some(port.as_raw_fd());
        Ok(Self { reader: BufReader::new(port), scan_timeout, tty_fd })
    }
}

impl<R: AsyncRead + Unpin + Send> NmeaGpsReceiver<R> {
    /// A receiver over an arbitrary byte stream. Only the internal buffer is discarded before a scan.
    pub fn new(source: R, scan_timeout: Duration) -> Self {
        Self { reader: BufReader::new(source), scan_timeout, tty_fd: None }
    }

    pub fn scan_timeout(&self) -> Duration { self.scan_timeout }

    fn discard_stale(&mut self) {
        if let Some(fd) = self.tty_fd {
            // SAFETY: `fd` belongs to the `SerialPort` owned by `self.reader` and is open as long as it is.
            // A failing flush (e.g. not a tty) only means there was no kernel queue to drop.
            unsafe {
                libc::tcflush(fd, libc::TCIFLUSH);
            }
        }
        let buffered = self.reader.buffer().len();
        self.reader.consume(buffered);
    }

    /// Scans for the next `GGA` sentence reporting a fix. Sentences without fix quality or
    /// without usable coordinates are skipped.
    ///
    /// # Returns
    /// - The first fix read.
    /// - [`GpsFix::none`] if no fix arrived within the scan timeout.
    /// - `SensorError::Io` if the stream failed or was closed.
    pub async fn scan(&mut self) -> Result<GpsFix, SensorError> {
        self.discard_stale();
        let deadline = Instant::now() + self.scan_timeout;
        let mut raw = Vec::with_capacity(96);
        loop {
            raw.clear();
            match timeout_at(deadline, self.reader.read_until(b'\n', &mut raw)).await {
                Err(_) => return Ok(GpsFix::none()),
                Ok(Ok(0)) => return Err(SensorError::Io(io::ErrorKind::UnexpectedEof)),
                Ok(Ok(_)) => {
                    let fix = parse_gga(&String::from_utf8_lossy(&raw)).map(|gga| gga.to_gps_fix());
                    if let Some(fix) = fix.filter(GpsFix::has_fix) {
                        return Ok(fix);
                    }
                }
                Ok(Err(e)) => return Err(SensorError::Io(e.kind())),
            }
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> PositionSensor for NmeaGpsReceiver<R> {
    async fn read_fix(&mut self) -> Result<GpsFix, SensorError> { self.scan().await }
}
