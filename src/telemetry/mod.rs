//! Durable per-tick mission record: one CSV line per control tick, flushed and synced before the
//! tick continues.

mod telemetry_logger;
mod telemetry_record;

pub use telemetry_logger::{TelemetryError, TelemetryLogger};
pub use telemetry_record::{NavSnapshot, TELEMETRY_HEADER, TelemetryRecord};
