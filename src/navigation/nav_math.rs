use super::geo_point::GeoPoint;
use strum_macros::Display;

/// Mean earth radius used for every great-circle computation.
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum NavMathError {
    NonFiniteAngle,
    NonFiniteCoordinate,
}

impl std::error::Error for NavMathError {}

fn check_coordinates(a: GeoPoint, b: GeoPoint) -> Result<(), NavMathError> {
    if a.is_finite() && b.is_finite() { Ok(()) } else { Err(NavMathError::NonFiniteCoordinate) }
}

/// Haversine great-circle distance between `a` and `b`.
///
/// # Arguments
/// - `a`: The first position.
/// - `b`: The second position.
///
/// # Returns
/// - The distance in meters, identical for `(a, b)` and `(b, a)`.
/// - `NavMathError::NonFiniteCoordinate` if any coordinate is `NaN` or infinite.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> Result<f64, NavMathError> {
    check_coordinates(a, b)?;
    let phi_a = a.lat().to_radians();
    let phi_b = b.lat().to_radians();
    // abs() keeps the half-angle sines identical in both argument orders
    let half_d_phi = (b.lat() - a.lat()).abs().to_radians() / 2.0;
    let half_d_lambda = (b.lon() - a.lon()).abs().to_radians() / 2.0;
    let hav = half_d_phi.sin().powi(2) + phi_a.cos() * phi_b.cos() * half_d_lambda.sin().powi(2);
    // rounding can push the term slightly outside [0, 1] near identical or antipodal points
    let hav = hav.clamp(0.0, 1.0);
    Ok(2.0 * EARTH_MEAN_RADIUS_M * hav.sqrt().asin())
}

/// Initial great-circle bearing from `from` towards `to`.
///
/// # Returns
/// - Degrees clockwise from true north in `[0, 360)`.
/// - `NavMathError::NonFiniteCoordinate` for non-finite input.
pub fn bearing_degrees(from: GeoPoint, to: GeoPoint) -> Result<f64, NavMathError> {
    check_coordinates(from, to)?;
    let phi_from = from.lat().to_radians();
    let phi_to = to.lat().to_radians();
    let d_lambda = (to.lon() - from.lon()).to_radians();
    let y = d_lambda.sin() * phi_to.cos();
    let x = phi_from.cos() * phi_to.sin() - phi_from.sin() * phi_to.cos() * d_lambda.cos();
    Ok(wrap_360(y.atan2(x).to_degrees()))
}

/// Reduces a heading difference to the half-open interval `(-180, 180]`.
///
/// Runs in constant time through euclidean remainder instead of repeated ±360 steps.
/// Non-finite input is rejected with `NavMathError::NonFiniteAngle`.
pub fn normalize_angle_error(error_deg: f64) -> Result<f64, NavMathError> {
    if !error_deg.is_finite() {
        return Err(NavMathError::NonFiniteAngle);
    }
    let wrapped = error_deg.rem_euclid(360.0);
    if wrapped > 180.0 { Ok(wrapped - 360.0) } else { Ok(wrapped) }
}

fn wrap_360(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid may round tiny negative values up to exactly 360.0
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
