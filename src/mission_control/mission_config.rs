use crate::navigation::{GeoPoint, MissionTarget};
use crate::warn;
use std::{env, path::PathBuf, str::FromStr, time::Duration};
use strum_macros::Display;

#[derive(Debug, Display, Clone, PartialEq)]
pub enum ConfigError {
    NonFinite(&'static str),
    NonPositive(&'static str),
    OutOfRange(&'static str),
    TargetOutOfRange,
    EmptyHistoryWindow,
}

impl std::error::Error for ConfigError {}

/// Startup configuration of one mission. Fixed once the mission loop is constructed.
#[derive(Debug, Clone)]
pub struct MissionConfig {
    pub target: GeoPoint,
    pub goal_radius_m: f64,
    pub kp_gain: f64,
    pub base_speed: f64,
    pub drop_threshold_m: f64,
    pub landing_threshold_m: f64,
    pub history_window: usize,
    pub wait_duration: Duration,
    pub max_drive_duration: Duration,
    pub tick_period: Duration,
    pub gps_timeout: Duration,
    pub log_dir: PathBuf,
    pub gps_port: Option<PathBuf>,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            target: Self::DEF_TARGET,
            goal_radius_m: 3.0,
            kp_gain: 0.015,
            base_speed: 0.5,
            drop_threshold_m: 10.0,
            landing_threshold_m: 2.0,
            history_window: 50,
            wait_duration: Duration::from_secs(300),
            max_drive_duration: Duration::from_secs(600),
            tick_period: Duration::from_millis(100),
            gps_timeout: Duration::from_secs(2),
            log_dir: PathBuf::from("/home/cansat/logs"),
            gps_port: None,
        }
    }
}

impl MissionConfig {
    const DEF_TARGET: GeoPoint = GeoPoint::new(35.707_068, 139.704_465);

    /// Defaults overridden by any `CANSAT_*` variables present in the environment.
    pub fn from_env() -> Self {
        let def = Self::default();
        Self {
            target: GeoPoint::new(
                env_or("CANSAT_TARGET_LAT", def.target.lat()),
                env_or("CANSAT_TARGET_LON", def.target.lon()),
            ),
            goal_radius_m: env_or("CANSAT_GOAL_RADIUS_M", def.goal_radius_m),
            kp_gain: env_or("CANSAT_KP_GAIN", def.kp_gain),
            base_speed: env_or("CANSAT_BASE_SPEED", def.base_speed),
            drop_threshold_m: env_or("CANSAT_DROP_THRESHOLD_M", def.drop_threshold_m),
            landing_threshold_m: env_or("CANSAT_LANDING_THRESHOLD_M", def.landing_threshold_m),
            history_window: env_or("CANSAT_HISTORY_WINDOW", def.history_window),
            wait_duration: env_secs_or("CANSAT_WAIT_S", def.wait_duration),
            max_drive_duration: env_secs_or("CANSAT_MAX_DRIVE_S", def.max_drive_duration),
            tick_period: env_secs_or("CANSAT_TICK_S", def.tick_period),
            gps_timeout: env_secs_or("CANSAT_GPS_TIMEOUT_S", def.gps_timeout),
            log_dir: env::var("CANSAT_LOG_DIR").map_or(def.log_dir, PathBuf::from),
            gps_port: env::var("CANSAT_GPS_PORT").ok().map(PathBuf::from),
        }
    }

    pub fn mission_target(&self) -> MissionTarget { MissionTarget::new(self.target, self.goal_radius_m) }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("target", self.target.lat() + self.target.lon()),
            ("goal_radius_m", self.goal_radius_m),
            ("kp_gain", self.kp_gain),
            ("base_speed", self.base_speed),
            ("drop_threshold_m", self.drop_threshold_m),
            ("landing_threshold_m", self.landing_threshold_m),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NonFinite(*name));
        }
        if self.target.lat().abs() > 90.0 || self.target.lon().abs() > 180.0 {
            return Err(ConfigError::TargetOutOfRange);
        }
        if self.base_speed <= 0.0 || self.base_speed > 1.0 {
            return Err(ConfigError::OutOfRange("base_speed"));
        }
        if self.kp_gain < 0.0 {
            return Err(ConfigError::OutOfRange("kp_gain"));
        }
        let positive = [
            ("goal_radius_m", self.goal_radius_m > 0.0),
            ("drop_threshold_m", self.drop_threshold_m > 0.0),
            ("landing_threshold_m", self.landing_threshold_m >= 0.0),
            ("tick_period", !self.tick_period.is_zero()),
            ("gps_timeout", !self.gps_timeout.is_zero()),
            ("max_drive_duration", !self.max_drive_duration.is_zero()),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, ok)| !ok) {
            return Err(ConfigError::NonPositive(*name));
        }
        if self.history_window == 0 {
            return Err(ConfigError::EmptyHistoryWindow);
        }
        Ok(())
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring malformed {key}={raw}, keeping default");
            default
        }),
        Err(_) => default,
    }
}

fn env_secs_or(key: &str, default: Duration) -> Duration {
    let secs = env_or(key, default.as_secs_f64());
    Duration::try_from_secs_f64(secs).unwrap_or_else(|_| {
        warn!("Ignoring out of range {key}={secs}, keeping default");
        default
    })
}
