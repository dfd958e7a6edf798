//! Read/write contracts of the hardware collaborators and the implementations this crate ships:
//! a serial NMEA receiver and a simulated vehicle for dry runs.
//!
//! Sensor drivers and motor PWM are outside this crate. Anything that can answer the traits
//! below can be plugged into a [`SensorSuite`] / [`MotorGuard`].

mod motor_guard;
mod nmea;
mod nmea_gps;
mod sensor_suite;
mod simulated;

pub use motor_guard::MotorGuard;
pub use nmea::{GgaFix, parse_gga};
pub use nmea_gps::{NmeaGpsReceiver, SerialPort};
pub use sensor_suite::{SensorSnapshot, SensorSuite, altitude_from_pressure};
pub use simulated::{SimScenario, SimulatedCanSat};

use crate::navigation::GeoPoint;
use async_trait::async_trait;
use strum_macros::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor is not fitted on this vehicle.
    Absent,
    /// The sensor answered, but without this measurement.
    Unsupported,
    Timeout,
    InvalidReading,
    Io(std::io::ErrorKind),
}

impl std::error::Error for SensorError {}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    Rejected(MotorSide),
    Io(std::io::ErrorKind),
}

impl std::error::Error for ActuatorError {}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorSide {
    Left,
    Right,
}

/// Three-axis measurement (acceleration m/s², angular rate °/s, magnetic field µT).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Triplet {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Triplet {
    pub const fn new(x: f64, y: f64, z: f64) -> Self { Self { x, y, z } }
    pub fn is_finite(&self) -> bool { self.x.is_finite() && self.y.is_finite() && self.z.is_finite() }
}

/// Absolute orientation. `heading` is degrees clockwise from north in `[0, 360)`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    pub heading: f64,
    pub roll: f64,
    pub pitch: f64,
}

/// Output of one position read. A fix-less reading carries the origin as position.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GpsFix {
    has_fix: bool,
    position: GeoPoint,
}

impl GpsFix {
    pub fn fix(position: GeoPoint) -> Self { Self { has_fix: true, position } }
    pub fn none() -> Self { Self::default() }
    pub fn has_fix(&self) -> bool { self.has_fix }
    pub fn position(&self) -> GeoPoint { self.position }
}

#[async_trait]
pub trait PressureSensor: Send {
    async fn read_pressure_hpa(&mut self) -> Result<f64, SensorError>;
}

#[async_trait]
pub trait OrientationSensor: Send {
    async fn read_euler(&mut self) -> Result<EulerAngles, SensorError>;
    async fn read_acceleration(&mut self) -> Result<Triplet, SensorError> { Err(SensorError::Unsupported) }
    async fn read_gyro(&mut self) -> Result<Triplet, SensorError> { Err(SensorError::Unsupported) }
    async fn read_magnetic(&mut self) -> Result<Triplet, SensorError> { Err(SensorError::Unsupported) }
}

#[async_trait]
pub trait PositionSensor: Send {
    /// Must return within its own acquisition timeout, with [`GpsFix::none`] if no fresh fix arrived.
    async fn read_fix(&mut self) -> Result<GpsFix, SensorError>;
}

/// Differential motor driver. Callers pass values already clamped to `[-1.0, 1.0]`.
pub trait MotorDrive: Send {
    fn set_throttle(&mut self, side: MotorSide, value: f64) -> Result<(), ActuatorError>;
}
