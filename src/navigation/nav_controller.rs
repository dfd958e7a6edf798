use super::{
    geo_point::{GeoPoint, MissionTarget},
    nav_math::{NavMathError, bearing_degrees, distance_meters, normalize_angle_error},
};

/// Clamps a throttle value into `[-1.0, 1.0]`. `NaN` maps to a stopped motor.
pub fn clamp_throttle(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) }
}

/// A left/right throttle pair. Construction always clamps, so a `DriveCommand` never
/// carries a value outside `[-1.0, 1.0]`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DriveCommand {
    left: f64,
    right: f64,
}

impl DriveCommand {
    pub const STOP: DriveCommand = DriveCommand { left: 0.0, right: 0.0 };

    pub fn new(left: f64, right: f64) -> Self {
        Self { left: clamp_throttle(left), right: clamp_throttle(right) }
    }

    pub fn left(&self) -> f64 { self.left }
    pub fn right(&self) -> f64 { self.right }
    pub fn is_stopped(&self) -> bool { self.left == 0.0 && self.right == 0.0 }
}

/// One-way arrival flag. There is no way to clear it once set.
#[derive(Debug, Default)]
pub struct GoalLatch {
    reached: bool,
}

impl GoalLatch {
    pub fn is_set(&self) -> bool { self.reached }

    /// Sets the latch. Returns `true` only for the call that actually flipped it.
    fn latch(&mut self) -> bool {
        let first = !self.reached;
        self.reached = true;
        first
    }
}

/// Result of one controller step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavOutput {
    command: DriveCommand,
    distance_m: f64,
    bearing_deg: f64,
    arrived: bool,
}

impl NavOutput {
    fn hold() -> Self {
        Self { command: DriveCommand::STOP, distance_m: 0.0, bearing_deg: 0.0, arrived: false }
    }

    pub fn command(&self) -> DriveCommand { self.command }
    pub fn distance_m(&self) -> f64 { self.distance_m }
    pub fn bearing_deg(&self) -> f64 { self.bearing_deg }
    /// `true` exactly once per mission: on the step that set the goal latch.
    pub fn arrived(&self) -> bool { self.arrived }
}

/// Proportional heading controller driving the rover towards a fixed [`MissionTarget`].
#[derive(Debug)]
pub struct NavigationController {
    target: MissionTarget,
    kp_gain: f64,
    base_speed: f64,
    goal: GoalLatch,
}

impl NavigationController {
    pub fn new(target: MissionTarget, kp_gain: f64, base_speed: f64) -> Self {
        Self { target, kp_gain, base_speed, goal: GoalLatch::default() }
    }

    pub fn target(&self) -> &MissionTarget { &self.target }
    pub fn goal_reached(&self) -> bool { self.goal.is_set() }

    /// Distance and bearing from `position` to the target without steering or touching the latch.
    pub fn locate(&self, position: GeoPoint) -> Result<(f64, f64), NavMathError> {
        let target = self.target.point();
        Ok((distance_meters(position, target)?, bearing_degrees(position, target)?))
    }

    /// Computes the drive command for the current position and heading.
    ///
    /// # Arguments
    /// - `position`: Current GPS position, ignored without a fix.
    /// - `heading_deg`: Current heading, degrees clockwise from true north.
    /// - `has_fix`: Whether `position` comes from a valid fix.
    ///
    /// # Returns
    /// - A stopped `NavOutput` with zero distance and bearing when there is no fix.
    /// - A stopped `NavOutput` once the goal latch is set, for every later call.
    /// - Otherwise the clamped differential command `base ∓ error · kp`.
    /// - `NavMathError` for non-finite position or heading. The caller holds position.
    pub fn step(
        &mut self,
        position: GeoPoint,
        heading_deg: f64,
        has_fix: bool,
    ) -> Result<NavOutput, NavMathError> {
        if !has_fix {
            return Ok(NavOutput::hold());
        }
        let (distance_m, bearing_deg) = self.locate(position)?;

        let arrived = distance_m < self.target.goal_radius_m() && self.goal.latch();
        if self.goal.is_set() {
            return Ok(NavOutput { command: DriveCommand::STOP, distance_m, bearing_deg, arrived });
        }

        let angle_error = normalize_angle_error(bearing_deg - heading_deg)?;
        let turn = angle_error * self.kp_gain;
        Ok(NavOutput {
            command: DriveCommand::new(self.base_speed - turn, self.base_speed + turn),
            distance_m,
            bearing_deg,
            arrived,
        })
    }
}
