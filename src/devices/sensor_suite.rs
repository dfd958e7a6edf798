use super::{
    EulerAngles, GpsFix, OrientationSensor, PositionSensor, PressureSensor, SensorError, Triplet,
};
use crate::event;
use std::{future::Future, time::Duration};

/// Reference sea level pressure of the barometric altitude formula.
pub const SEA_LEVEL_HPA: f64 = 1013.25;

/// International barometric formula, meters above the `SEA_LEVEL_HPA` reference.
pub fn altitude_from_pressure(pressure_hpa: f64) -> f64 {
    44330.0 * (1.0 - (pressure_hpa / SEA_LEVEL_HPA).powf(0.1903))
}

/// One tick's worth of fused sensor data. Every field that could not be read holds zero.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SensorSnapshot {
    pub pressure_hpa: f64,
    pub altitude_m: f64,
    pub altitude_valid: bool,
    pub euler: EulerAngles,
    pub accel: Triplet,
    pub gyro: Triplet,
    pub mag: Triplet,
    pub fix: GpsFix,
}

impl SensorSnapshot {
    /// The altitude if it came from an actual pressure reading this tick.
    pub fn altitude(&self) -> Option<f64> { self.altitude_valid.then_some(self.altitude_m) }
}

/// The vehicle's sensor complement. Each slot is either fitted or absent; reading an absent
/// slot yields [`SensorError::Absent`] and the zero default, never a panic.
pub struct SensorSuite {
    pressure: Option<Box<dyn PressureSensor>>,
    orientation: Option<Box<dyn OrientationSensor>>,
    position: Option<Box<dyn PositionSensor>>,
    read_timeout: Duration,
    fix_timeout: Duration,
    faults: u64,
}

impl SensorSuite {
    /// An empty suite.
    ///
    /// # Arguments
    /// - `read_timeout`: Upper bound for a single pressure or orientation read.
    /// - `fix_timeout`: Upper bound for a position read, including its own acquisition scan.
    pub fn new(read_timeout: Duration, fix_timeout: Duration) -> Self {
        Self { pressure: None, orientation: None, position: None, read_timeout, fix_timeout, faults: 0 }
    }

    #[must_use]
    pub fn with_pressure(mut self, sensor: impl PressureSensor + 'static) -> Self {
        self.pressure = Some(Box::new(sensor));
        self
    }

    #[must_use]
    pub fn with_orientation(mut self, sensor: impl OrientationSensor + 'static) -> Self {
        self.orientation = Some(Box::new(sensor));
        self
    }

    #[must_use]
    pub fn with_position(mut self, sensor: impl PositionSensor + 'static) -> Self {
        self.position = Some(Box::new(sensor));
        self
    }

    pub fn has_pressure(&self) -> bool { self.pressure.is_some() }
    pub fn has_orientation(&self) -> bool { self.orientation.is_some() }
    pub fn has_position(&self) -> bool { self.position.is_some() }
    /// Number of failed reads on fitted sensors so far.
    pub fn faults(&self) -> u64 { self.faults }

    /// Reads every fitted sensor once. Never fails: a failed read leaves its fields at zero.
    ///
    /// A position read waits for the next fresh fix, so it is skipped unless `with_position` is set.
    /// The snapshot then reports no fix.
    pub async fn read_all(&mut self, with_position: bool) -> SensorSnapshot {
        let mut snap = SensorSnapshot::default();

        match self.read_pressure().await {
            Ok(pressure) => {
                snap.pressure_hpa = pressure;
                snap.altitude_m = altitude_from_pressure(pressure);
                snap.altitude_valid = true;
            }
            Err(e) => self.note_fault("pressure", e),
        }

        let (euler, accel, gyro, mag) = self.read_orientation().await;
        match euler {
            Ok(v) => snap.euler = v,
            Err(e) => self.note_fault("euler", e),
        }
        for (name, res, slot) in [
            ("acceleration", accel, &mut snap.accel),
            ("gyro", gyro, &mut snap.gyro),
            ("magnetic", mag, &mut snap.mag),
        ] {
            match res {
                Ok(v) => *slot = v,
                Err(e) => self.note_fault(name, e),
            }
        }

        if with_position {
            match self.read_position().await {
                Ok(fix) => snap.fix = fix,
                Err(e) => self.note_fault("position", e),
            }
        }
        snap
    }

    async fn read_pressure(&mut self) -> Result<f64, SensorError> {
        let Some(sensor) = self.pressure.as_mut() else {
            return Err(SensorError::Absent);
        };
        let pressure = bounded(self.read_timeout, sensor.read_pressure_hpa()).await?;
        if pressure.is_finite() && pressure > 0.0 { Ok(pressure) } else { Err(SensorError::InvalidReading) }
    }

    #[allow(clippy::type_complexity)]
    async fn read_orientation(
        &mut self,
    ) -> (
        Result<EulerAngles, SensorError>,
        Result<Triplet, SensorError>,
        Result<Triplet, SensorError>,
        Result<Triplet, SensorError>,
    ) {
        let limit = self.read_timeout;
        let Some(sensor) = self.orientation.as_mut() else {
            let absent = Err(SensorError::Absent);
            return (Err(SensorError::Absent), absent, absent, absent);
        };
        let euler = bounded(limit, sensor.read_euler()).await.and_then(|e| {
            let finite = e.heading.is_finite() && e.roll.is_finite() && e.pitch.is_finite();
            if finite { Ok(e) } else { Err(SensorError::InvalidReading) }
        });
        let accel = bounded(limit, sensor.read_acceleration()).await.and_then(finite_triplet);
        let gyro = bounded(limit, sensor.read_gyro()).await.and_then(finite_triplet);
        let mag = bounded(limit, sensor.read_magnetic()).await.and_then(finite_triplet);
        (euler, accel, gyro, mag)
    }

    async fn read_position(&mut self) -> Result<GpsFix, SensorError> {
        let Some(sensor) = self.position.as_mut() else {
            return Err(SensorError::Absent);
        };
        let fix = bounded(self.fix_timeout, sensor.read_fix()).await?;
        if fix.has_fix() && !fix.position().is_finite() {
            return Err(SensorError::InvalidReading);
        }
        Ok(fix)
    }

    fn note_fault(&mut self, what: &str, e: SensorError) {
        if matches!(e, SensorError::Absent | SensorError::Unsupported) {
            return;
        }
        self.faults += 1;
        event!("{what} read failed ({e:?}), substituting default");
    }
}

fn finite_triplet(t: Triplet) -> Result<Triplet, SensorError> {
    if t.is_finite() { Ok(t) } else { Err(SensorError::InvalidReading) }
}

async fn bounded<T>(
    limit: Duration,
    read: impl Future<Output = Result<T, SensorError>>,
) -> Result<T, SensorError> {
    tokio::time::timeout(limit, read).await.map_err(|_| SensorError::Timeout)?
}
