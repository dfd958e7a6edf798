use super::{
    DriveCommand, GeoPoint, MissionTarget, NavMathError, NavigationController, bearing_degrees,
    clamp_throttle, distance_meters, normalize_angle_error,
};
use rand::Rng;

const TARGET: GeoPoint = GeoPoint::new(35.707_068, 139.704_465);

fn rand_point(rng: &mut impl Rng) -> GeoPoint {
    GeoPoint::new(rng.random_range(-90.0..=90.0), rng.random_range(-180.0..=180.0))
}

fn controller() -> NavigationController {
    NavigationController::new(MissionTarget::new(TARGET, 3.0), 0.015, 0.5)
}

/// Offsets `p` by `north_m` / `east_m` on a local flat-earth approximation.
fn offset(p: GeoPoint, north_m: f64, east_m: f64) -> GeoPoint {
    let d_lat = (north_m / super::EARTH_MEAN_RADIUS_M).to_degrees();
    let d_lon = (east_m / (super::EARTH_MEAN_RADIUS_M * p.lat().to_radians().cos())).to_degrees();
    GeoPoint::new(p.lat() + d_lat, p.lon() + d_lon)
}

#[test]
fn test_distance_identity_and_symmetry() {
    let mut rng = rand::rng();
    for _ in 0..1000 {
        let a = rand_point(&mut rng);
        let b = rand_point(&mut rng);
        assert_eq!(distance_meters(a, a).unwrap(), 0.0);
        assert_eq!(distance_meters(a, b).unwrap(), distance_meters(b, a).unwrap());
    }
}

#[test]
fn test_distance_known_values() {
    // one degree of latitude on the mean sphere
    let one_deg = distance_meters(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0)).unwrap();
    assert!((one_deg - 111_194.93).abs() < 0.1, "got {one_deg}");

    let north = offset(TARGET, 10.0, 0.0);
    let d = distance_meters(north, TARGET).unwrap();
    assert!((d - 10.0).abs() < 0.01, "got {d}");
}

#[test]
fn test_distance_antipodal_is_finite() {
    let a = GeoPoint::new(35.0, 139.0);
    let b = GeoPoint::new(-35.0, -41.0);
    let d = distance_meters(a, b).unwrap();
    let half_circumference = std::f64::consts::PI * super::EARTH_MEAN_RADIUS_M;
    assert!(d.is_finite());
    assert!((d - half_circumference).abs() < 1.0, "got {d}");
}

#[test]
fn test_non_finite_coordinates_rejected() {
    let bad = GeoPoint::new(f64::NAN, 10.0);
    assert_eq!(distance_meters(bad, TARGET), Err(NavMathError::NonFiniteCoordinate));
    assert_eq!(
        bearing_degrees(TARGET, GeoPoint::new(1.0, f64::INFINITY)),
        Err(NavMathError::NonFiniteCoordinate)
    );
}

#[test]
fn test_bearing_cardinal_directions() {
    let north = offset(TARGET, 50.0, 0.0);
    let east = offset(TARGET, 0.0, 50.0);
    let south = offset(TARGET, -50.0, 0.0);
    let west = offset(TARGET, 0.0, -50.0);
    assert!(bearing_degrees(TARGET, north).unwrap() < 0.01);
    assert!((bearing_degrees(TARGET, east).unwrap() - 90.0).abs() < 0.01);
    assert!((bearing_degrees(TARGET, south).unwrap() - 180.0).abs() < 0.01);
    assert!((bearing_degrees(TARGET, west).unwrap() - 270.0).abs() < 0.01);
}

#[test]
fn test_bearing_range() {
    let mut rng = rand::rng();
    for _ in 0..1000 {
        let b = bearing_degrees(rand_point(&mut rng), rand_point(&mut rng)).unwrap();
        assert!((0.0..360.0).contains(&b), "bearing {b} out of range");
    }
}

#[test]
fn test_normalize_angle_error() {
    assert_eq!(normalize_angle_error(270.0).unwrap(), -90.0);
    assert_eq!(normalize_angle_error(-200.0).unwrap(), 160.0);
    assert_eq!(normalize_angle_error(180.0).unwrap(), 180.0);
    assert_eq!(normalize_angle_error(-180.0).unwrap(), 180.0);
    assert_eq!(normalize_angle_error(360.0).unwrap(), 0.0);
    assert_eq!(normalize_angle_error(-45.0).unwrap(), -45.0);
    assert_eq!(normalize_angle_error(f64::NAN), Err(NavMathError::NonFiniteAngle));
    assert_eq!(normalize_angle_error(f64::NEG_INFINITY), Err(NavMathError::NonFiniteAngle));

    let mut rng = rand::rng();
    for _ in 0..10_000 {
        let x = rng.random_range(-1.0e9..1.0e9);
        let n = normalize_angle_error(x).unwrap();
        assert!(n > -180.0 && n <= 180.0, "normalize({x}) = {n}");
    }
    assert!(normalize_angle_error(f64::MAX).unwrap().abs() <= 180.0);
}

#[test]
fn test_clamp_throttle() {
    assert_eq!(clamp_throttle(1.5), 1.0);
    assert_eq!(clamp_throttle(-2.0), -1.0);
    assert_eq!(clamp_throttle(0.3), 0.3);
    assert_eq!(clamp_throttle(f64::NAN), 0.0);
    let cmd = DriveCommand::new(3.0, -7.5);
    assert_eq!((cmd.left(), cmd.right()), (1.0, -1.0));
}

#[test]
fn test_no_fix_holds_position() {
    let mut ctrl = controller();
    let out = ctrl.step(offset(TARGET, 100.0, 0.0), 0.0, false).unwrap();
    assert!(out.command().is_stopped());
    assert_eq!(out.distance_m(), 0.0);
    assert_eq!(out.bearing_deg(), 0.0);
    assert!(!ctrl.goal_reached());
}

#[test]
fn test_steering_direction_and_gain() {
    let mut ctrl = controller();
    // target due north, already facing north: straight ahead
    let out = ctrl.step(offset(TARGET, -50.0, 0.0), 0.0, true).unwrap();
    assert!((out.command().left() - 0.5).abs() < 1e-3);
    assert!((out.command().right() - 0.5).abs() < 1e-3);

    // facing east (90°) with the target due north: error -90°, turn -1.35
    let out = ctrl.step(offset(TARGET, -50.0, 0.0), 90.0, true).unwrap();
    assert!((out.command().left() - 1.0).abs() < 1e-9);
    assert!((out.command().right() + 0.85).abs() < 1e-3);
    assert!((out.distance_m() - 50.0).abs() < 0.01);
}

#[test]
fn test_non_finite_heading_is_error() {
    let mut ctrl = controller();
    let res = ctrl.step(offset(TARGET, -50.0, 0.0), f64::NAN, true);
    assert_eq!(res, Err(NavMathError::NonFiniteAngle));
    assert!(!ctrl.goal_reached());
}

#[test]
fn test_goal_latch_is_sticky() {
    let mut ctrl = controller();
    let first = ctrl.step(TARGET, 0.0, true).unwrap();
    assert!(first.arrived());
    assert!(first.command().is_stopped());
    assert_eq!(first.distance_m(), 0.0);
    assert!(ctrl.goal_reached());

    let mut rng = rand::rng();
    for _ in 0..200 {
        let far = offset(TARGET, rng.random_range(-500.0..500.0), rng.random_range(-500.0..500.0));
        let out = ctrl.step(far, rng.random_range(0.0..360.0), true).unwrap();
        assert!(out.command().is_stopped());
        assert!(!out.arrived());
    }
    // no fix and bad heading after arrival keep the motors stopped too
    assert!(ctrl.step(TARGET, 0.0, false).unwrap().command().is_stopped());
    assert!(ctrl.step(offset(TARGET, 20.0, 0.0), f64::NAN, true).unwrap().command().is_stopped());
    assert!(ctrl.goal_reached());
}

#[test]
fn test_goal_radius_is_exclusive() {
    let mut ctrl = NavigationController::new(MissionTarget::new(TARGET, 3.0), 0.015, 0.5);
    let out = ctrl.step(offset(TARGET, 3.5, 0.0), 180.0, true).unwrap();
    assert!(!out.arrived());
    assert!(!out.command().is_stopped());
    let out = ctrl.step(offset(TARGET, 2.5, 0.0), 180.0, true).unwrap();
    assert!(out.arrived());
}

#[test]
fn test_locate_leaves_latch_alone() {
    let ctrl = controller();
    let (distance, bearing) = ctrl.locate(offset(TARGET, 0.0, -30.0)).unwrap();
    assert!((distance - 30.0).abs() < 0.01);
    assert!((bearing - 90.0).abs() < 0.01);
    let (distance, _) = ctrl.locate(TARGET).unwrap();
    assert_eq!(distance, 0.0);
    assert!(!ctrl.goal_reached());
    assert_eq!(ctrl.locate(GeoPoint::new(f64::NAN, 0.0)), Err(NavMathError::NonFiniteCoordinate));
}
