use std::fmt::{Display, Formatter};

/// A WGS-84 position in signed decimal degrees (negative = south / west).
#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self { Self { lat, lon } }
    pub fn lat(&self) -> f64 { self.lat }
    pub fn lon(&self) -> f64 { self.lon }
    pub fn is_finite(&self) -> bool { self.lat.is_finite() && self.lon.is_finite() }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// The fixed goal of the drive phase. Immutable once the mission is running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissionTarget {
    point: GeoPoint,
    goal_radius_m: f64,
}

impl MissionTarget {
    pub fn new(point: GeoPoint, goal_radius_m: f64) -> Self { Self { point, goal_radius_m } }
    pub fn point(&self) -> GeoPoint { self.point }
    pub fn goal_radius_m(&self) -> f64 { self.goal_radius_m }
}
