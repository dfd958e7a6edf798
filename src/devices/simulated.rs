use super::{
    ActuatorError, EulerAngles, GpsFix, MotorDrive, MotorSide, OrientationSensor, PositionSensor,
    PressureSensor, SensorError, Triplet, sensor_suite::SEA_LEVEL_HPA,
};
use crate::mission_control::MissionConfig;
use crate::navigation::{EARTH_MEAN_RADIUS_M, GeoPoint};
use async_trait::async_trait;
use rand::Rng;
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::time::Instant;

const GRAVITY: f64 = 9.806_65;
const FIELD_STRENGTH_UT: f64 = 45.0;

/// Flight profile and rover model of a simulated mission.
#[derive(Debug, Clone)]
pub struct SimScenario {
    /// Time from simulation start until the canister starts falling.
    pub release_after: Duration,
    pub start_altitude_m: f64,
    pub ground_altitude_m: f64,
    pub descent_rate_mps: f64,
    /// Peak uniform noise added to every barometric altitude.
    pub altitude_noise_m: f64,
    pub start_position: GeoPoint,
    pub start_heading_deg: f64,
    /// Time from simulation start until the receiver reports a fix.
    pub gps_acquire_after: Duration,
    /// Ground speed at full throttle on both sides.
    pub max_speed_mps: f64,
    /// Yaw rate per unit of right-minus-left throttle, clockwise positive.
    pub turn_rate_dps: f64,
}

impl SimScenario {
    /// A drop released ten seconds after the arming countdown, landing 40 m south-west of the target
    /// with the rover facing east.
    pub fn for_mission(config: &MissionConfig) -> Self {
        Self {
            release_after: config.wait_duration + Duration::from_secs(10),
            start_altitude_m: 150.0,
            ground_altitude_m: 40.0,
            descent_rate_mps: 6.0,
            altitude_noise_m: 0.3,
            start_position: offset_position(config.target, -28.0, -28.0),
            start_heading_deg: 90.0,
            gps_acquire_after: Duration::from_secs(5),
            max_speed_mps: 1.0,
            turn_rate_dps: 60.0,
        }
    }

    /// Time from simulation start until touchdown.
    pub fn touchdown_after(&self) -> Duration {
        let fall = (self.start_altitude_m - self.ground_altitude_m).max(0.0) / self.descent_rate_mps;
        self.release_after + Duration::from_secs_f64(fall)
    }

    fn altitude_at(&self, elapsed: Duration) -> f64 {
        match elapsed.checked_sub(self.release_after) {
            None => self.start_altitude_m,
            Some(falling) => (self.start_altitude_m - falling.as_secs_f64() * self.descent_rate_mps)
                .max(self.ground_altitude_m),
        }
    }
}

/// Moves `p` by `north_m` / `east_m` meters on a local tangent plane.
fn offset_position(p: GeoPoint, north_m: f64, east_m: f64) -> GeoPoint {
    let d_lat = (north_m / EARTH_MEAN_RADIUS_M).to_degrees();
    let d_lon = (east_m / (EARTH_MEAN_RADIUS_M * p.lat().to_radians().cos())).to_degrees();
    GeoPoint::new(p.lat() + d_lat, p.lon() + d_lon)
}

fn pressure_from_altitude(altitude_m: f64) -> f64 {
    SEA_LEVEL_HPA * (1.0 - altitude_m / 44330.0).powf(1.0 / 0.1903)
}

#[derive(Debug)]
struct SimWorld {
    scenario: SimScenario,
    started_at: Instant,
    last_update: Instant,
    position: GeoPoint,
    heading_deg: f64,
    yaw_rate_dps: f64,
    left: f64,
    right: f64,
}

impl SimWorld {
    fn elapsed(&self, now: Instant) -> Duration { now.saturating_duration_since(self.started_at) }

    fn landed(&self, now: Instant) -> bool { self.elapsed(now) >= self.scenario.touchdown_after() }

    /// Integrates the differential drive up to `now` with the throttle held since the last update.
    fn advance(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.last_update = now;
        if !self.landed(now) {
            self.yaw_rate_dps = 0.0;
            return;
        }
        let speed = (self.left + self.right) / 2.0 * self.scenario.max_speed_mps;
        // right-over-left differential swings this chassis clockwise
        self.yaw_rate_dps = (self.right - self.left) * self.scenario.turn_rate_dps;
        self.heading_deg = (self.heading_deg + self.yaw_rate_dps * dt).rem_euclid(360.0);
        let heading = self.heading_deg.to_radians();
        self.position = offset_position(
            self.position,
            speed * dt * heading.cos(),
            speed * dt * heading.sin(),
        );
    }
}

/// Software model of the canister and rover. Cloning shares the same world, so sensor and motor
/// handles handed to the mission loop stay observable from the outside.
#[derive(Debug, Clone)]
pub struct SimulatedCanSat {
    world: Arc<Mutex<SimWorld>>,
}

impl SimulatedCanSat {
    pub fn new(scenario: SimScenario) -> Self {
        let now = Instant::now();
        let world = SimWorld {
            position: scenario.start_position,
            heading_deg: scenario.start_heading_deg,
            scenario,
            started_at: now,
            last_update: now,
            yaw_rate_dps: 0.0,
            left: 0.0,
            right: 0.0,
        };
        Self { world: Arc::new(Mutex::new(world)) }
    }

    fn world(&self) -> MutexGuard<'_, SimWorld> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn barometer(&self) -> SimBarometer { SimBarometer(self.clone()) }
    pub fn imu(&self) -> SimImu { SimImu(self.clone()) }
    pub fn gps(&self) -> SimGps { SimGps(self.clone()) }
    pub fn motors(&self) -> SimMotors { SimMotors(self.clone()) }

    pub fn position(&self) -> GeoPoint {
        let mut world = self.world();
        world.advance(Instant::now());
        world.position
    }

    pub fn throttle(&self) -> (f64, f64) {
        let world = self.world();
        (world.left, world.right)
    }

    /// Noise-free altitude at `now`.
    pub fn true_altitude(&self, now: Instant) -> f64 {
        let world = self.world();
        world.scenario.altitude_at(world.elapsed(now))
    }
}

pub struct SimBarometer(SimulatedCanSat);
pub struct SimImu(SimulatedCanSat);
pub struct SimGps(SimulatedCanSat);
pub struct SimMotors(SimulatedCanSat);

#[async_trait]
impl PressureSensor for SimBarometer {
    async fn read_pressure_hpa(&mut self) -> Result<f64, SensorError> {
        let now = Instant::now();
        let noise_m = self.0.world().scenario.altitude_noise_m;
        let noise = if noise_m > 0.0 { rand::rng().random_range(-noise_m..=noise_m) } else { 0.0 };
        Ok(pressure_from_altitude(self.0.true_altitude(now) + noise))
    }
}

#[async_trait]
impl OrientationSensor for SimImu {
    async fn read_euler(&mut self) -> Result<EulerAngles, SensorError> {
        let mut world = self.0.world();
        world.advance(Instant::now());
        let mut rng = rand::rng();
        Ok(EulerAngles {
            heading: world.heading_deg,
            roll: rng.random_range(-0.5..=0.5),
            pitch: rng.random_range(-0.5..=0.5),
        })
    }

    async fn read_acceleration(&mut self) -> Result<Triplet, SensorError> {
        let mut rng = rand::rng();
        Ok(Triplet::new(
            rng.random_range(-0.05..=0.05),
            rng.random_range(-0.05..=0.05),
            GRAVITY + rng.random_range(-0.05..=0.05),
        ))
    }

    async fn read_gyro(&mut self) -> Result<Triplet, SensorError> {
        let world = self.0.world();
        Ok(Triplet::new(0.0, 0.0, world.yaw_rate_dps))
    }

    async fn read_magnetic(&mut self) -> Result<Triplet, SensorError> {
        let world = self.0.world();
        let heading = world.heading_deg.to_radians();
        Ok(Triplet::new(
            FIELD_STRENGTH_UT * heading.cos(),
            -FIELD_STRENGTH_UT * heading.sin(),
            0.0,
        ))
    }
}

#[async_trait]
impl PositionSensor for SimGps {
    async fn read_fix(&mut self) -> Result<GpsFix, SensorError> {
        let now = Instant::now();
        let mut world = self.0.world();
        if world.elapsed(now) < world.scenario.gps_acquire_after {
            return Ok(GpsFix::none());
        }
        world.advance(now);
        Ok(GpsFix::fix(world.position))
    }
}

impl MotorDrive for SimMotors {
    fn set_throttle(&mut self, side: MotorSide, value: f64) -> Result<(), ActuatorError> {
        if !(-1.0..=1.0).contains(&value) {
            return Err(ActuatorError::Rejected(side));
        }
        let mut world = self.0.world();
        world.advance(Instant::now());
        match side {
            MotorSide::Left => world.left = value,
            MotorSide::Right => world.right = value,
        }
        Ok(())
    }
}
