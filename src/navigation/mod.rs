//! Straight-line GPS navigation: great-circle geometry on WGS-84 coordinates and the
//! proportional heading controller that turns it into differential throttle.

mod geo_point;
mod nav_controller;
mod nav_math;
#[cfg(test)]
mod tests;

pub use geo_point::{GeoPoint, MissionTarget};
pub use nav_controller::{DriveCommand, GoalLatch, NavOutput, NavigationController, clamp_throttle};
pub use nav_math::{
    EARTH_MEAN_RADIUS_M, NavMathError, bearing_degrees, distance_meters, normalize_angle_error,
};
