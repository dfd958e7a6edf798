use crate::devices::SensorSnapshot;
use crate::mission_control::Phase;
use crate::navigation::{DriveCommand, GeoPoint};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Column header of the telemetry file.
pub const TELEMETRY_HEADER: &str = "Timestamp,Phase,Pressure,Altitude,Heading,Roll,Pitch,\
AccelX,AccelY,AccelZ,GyroX,GyroY,GyroZ,MagX,MagY,MagZ,\
Latitude,Longitude,Distance,Bearing,LeftThrottle,RightThrottle,Fix";

/// Navigation half of a telemetry record.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct NavSnapshot {
    pub position: GeoPoint,
    pub distance_m: f64,
    pub bearing_deg: f64,
    pub command: DriveCommand,
    pub fix_valid: bool,
}

/// One tick of mission data. Built once and only ever serialized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord {
    timestamp: DateTime<Utc>,
    phase: Phase,
    sensors: SensorSnapshot,
    nav: NavSnapshot,
}

impl TelemetryRecord {
    pub fn new(timestamp: DateTime<Utc>, phase: Phase, sensors: SensorSnapshot, nav: NavSnapshot) -> Self {
        Self { timestamp, phase, sensors, nav }
    }

    pub fn timestamp(&self) -> DateTime<Utc> { self.timestamp }
    pub fn phase(&self) -> Phase { self.phase }
    pub fn sensors(&self) -> &SensorSnapshot { &self.sensors }
    pub fn nav(&self) -> &NavSnapshot { &self.nav }

    /// Comma separated line in [`TELEMETRY_HEADER`] column order, without the line terminator.
    pub fn to_csv_line(&self) -> String {
        let s = &self.sensors;
        let n = &self.nav;
        let mut line = String::with_capacity(256);
        let _ = write!(line, "{},{}", self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"), self.phase);
        for v in [s.pressure_hpa, s.altitude_m, s.euler.heading, s.euler.roll, s.euler.pitch] {
            let _ = write!(line, ",{v:.2}");
        }
        for t in [s.accel, s.gyro, s.mag] {
            let _ = write!(line, ",{:.2},{:.2},{:.2}", t.x, t.y, t.z);
        }
        let _ = write!(
            line,
            ",{:.7},{:.7},{:.2},{:.2},{:.2},{:.2},{}",
            n.position.lat(),
            n.position.lon(),
            n.distance_m,
            n.bearing_deg,
            n.command.left(),
            n.command.right(),
            u8::from(n.fix_valid)
        );
        line
    }
}
