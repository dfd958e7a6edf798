use super::{altitude_history::AltitudeHistory, mission_config::MissionConfig, phase::Phase};
use crate::navigation::{DriveCommand, GeoPoint, NavMathError, NavigationController};
use std::time::Duration;
use tokio::time::Instant;

/// The subset of a fused sensor reading the state machine consumes each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseInput {
    /// `None` if the barometer delivered nothing usable this tick.
    pub altitude_m: Option<f64>,
    pub position: GeoPoint,
    pub heading_deg: f64,
    pub has_fix: bool,
}

/// A phase change together with the value that triggered it
/// (drop magnitude, stability band or elapsed seconds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    pub trigger: f64,
}

/// Everything one call to [`PhaseStateMachine::step`] decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseStep {
    pub phase: Phase,
    pub command: DriveCommand,
    pub distance_m: f64,
    pub bearing_deg: f64,
    pub arrived: bool,
    pub transition: Option<Transition>,
    pub nav_fault: Option<NavMathError>,
}

impl PhaseStep {
    fn idle(phase: Phase) -> Self {
        Self {
            phase,
            command: DriveCommand::STOP,
            distance_m: 0.0,
            bearing_deg: 0.0,
            arrived: false,
            transition: None,
            nav_fault: None,
        }
    }
}

/// Forward-only mission sequencer:
/// `WAITING → DROP_DETECT → LANDING_DETECT → DRIVING → DONE`.
///
/// At most one transition fires per step, and the only way to change `phase` is
/// [`Self::advance`], which can only move to [`Phase::next`].
#[derive(Debug)]
pub struct PhaseStateMachine {
    phase: Phase,
    history: AltitudeHistory,
    nav: NavigationController,
    armed_at: Instant,
    drive_started_at: Option<Instant>,
    wait_duration: Duration,
    max_drive_duration: Duration,
    drop_threshold_m: f64,
    landing_threshold_m: f64,
}

impl PhaseStateMachine {
    /// Creates the machine in `WAITING`. The arming countdown runs from `armed_at`.
    pub fn new(config: &MissionConfig, armed_at: Instant) -> Self {
        Self {
            phase: Phase::Waiting,
            history: AltitudeHistory::new(config.history_window),
            nav: NavigationController::new(config.mission_target(), config.kp_gain, config.base_speed),
            armed_at,
            drive_started_at: None,
            wait_duration: config.wait_duration,
            max_drive_duration: config.max_drive_duration,
            drop_threshold_m: config.drop_threshold_m,
            landing_threshold_m: config.landing_threshold_m,
        }
    }

    pub fn phase(&self) -> Phase { self.phase }
    pub fn history(&self) -> &AltitudeHistory { &self.history }
    pub fn goal_reached(&self) -> bool { self.nav.goal_reached() }
    pub fn drive_started_at(&self) -> Option<Instant> { self.drive_started_at }

    pub fn step(&mut self, now: Instant, input: &PhaseInput) -> PhaseStep {
        match self.phase {
            Phase::Waiting => self.step_waiting(now),
            Phase::DropDetect => self.step_drop_detect(input),
            Phase::LandingDetect => self.step_landing_detect(now, input),
            Phase::Driving => self.step_driving(now, input),
            Phase::Done => self.step_done(input),
        }
    }

    fn step_waiting(&mut self, now: Instant) -> PhaseStep {
        let waited = now.saturating_duration_since(self.armed_at);
        let mut res = PhaseStep::idle(self.phase);
        if waited >= self.wait_duration {
            res.transition = Some(self.advance(waited.as_secs_f64()));
            res.phase = self.phase;
        }
        res
    }

    fn step_drop_detect(&mut self, input: &PhaseInput) -> PhaseStep {
        let mut res = PhaseStep::idle(self.phase);
        if let Some(alt) = input.altitude_m {
            self.history.push(alt);
        }
        if self.history.is_full() {
            let drop = self.history.drop_magnitude();
            if drop >= self.drop_threshold_m {
                self.history.clear();
                res.transition = Some(self.advance(drop));
                res.phase = self.phase;
            }
        }
        res
    }

    fn step_landing_detect(&mut self, now: Instant, input: &PhaseInput) -> PhaseStep {
        let mut res = PhaseStep::idle(self.phase);
        if let Some(alt) = input.altitude_m {
            self.history.push(alt);
        }
        if self.history.is_full() {
            let band = self.history.stability_band();
            if band <= self.landing_threshold_m {
                self.history.clear();
                self.drive_started_at = Some(now);
                res.transition = Some(self.advance(band));
                res.phase = self.phase;
            }
        }
        res
    }

    fn step_driving(&mut self, now: Instant, input: &PhaseInput) -> PhaseStep {
        let mut res = PhaseStep::idle(self.phase);
        match self.nav.step(input.position, input.heading_deg, input.has_fix) {
            Ok(out) => {
                res.command = out.command();
                res.distance_m = out.distance_m();
                res.bearing_deg = out.bearing_deg();
                res.arrived = out.arrived();
            }
            Err(e) => res.nav_fault = Some(e),
        }

        let driven = self.drive_started_at.map_or(Duration::ZERO, |t| now.saturating_duration_since(t));
        if driven >= self.max_drive_duration || self.nav.goal_reached() {
            res.command = DriveCommand::STOP;
            res.transition = Some(self.advance(driven.as_secs_f64()));
            res.phase = self.phase;
        }
        res
    }

    /// Motors stay stopped, the position keeps being tracked against the target.
    fn step_done(&self, input: &PhaseInput) -> PhaseStep {
        let mut res = PhaseStep::idle(Phase::Done);
        if input.has_fix {
            match self.nav.locate(input.position) {
                Ok((distance_m, bearing_deg)) => {
                    res.distance_m = distance_m;
                    res.bearing_deg = bearing_deg;
                }
                Err(e) => res.nav_fault = Some(e),
            }
        }
        res
    }

    fn advance(&mut self, trigger: f64) -> Transition {
        let from = self.phase;
        // only reachable from non-terminal phases
        let to = from.next().unwrap_or(from);
        self.phase = to;
        Transition { from, to, trigger }
    }
}
