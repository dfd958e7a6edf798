use super::{
    mission_config::MissionConfig,
    phase::Phase,
    phase_machine::{PhaseInput, PhaseStateMachine, PhaseStep, Transition},
};
use crate::devices::{ActuatorError, MotorDrive, MotorGuard, SensorSnapshot, SensorSuite};
use crate::telemetry::{NavSnapshot, TelemetryLogger, TelemetryRecord};
use crate::{error, event, info, nav, warn};
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use strum_macros::Display;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum MissionError {
    Actuator(ActuatorError),
}

impl std::error::Error for MissionError {}

/// Paces the mission loop.
#[async_trait]
pub trait Ticker: Send {
    /// Completes when the next tick is due.
    async fn tick(&mut self);
}

/// Fixed-period ticker. A tick that overruns its period delays the schedule instead of
/// producing a burst of catch-up ticks.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Must be created inside the tokio runtime.
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) { self.interval.tick().await; }
}

/// Summary of a finished mission run.
#[derive(Debug, Clone)]
pub struct MissionReport {
    ticks: u64,
    final_phase: Phase,
    transitions: Vec<(u64, Transition)>,
    goal_reached: bool,
    telemetry_failures: u64,
    nav_faults: u64,
    sensor_faults: u64,
}

impl MissionReport {
    fn new() -> Self {
        Self {
            ticks: 0,
            final_phase: Phase::Waiting,
            transitions: Vec::new(),
            goal_reached: false,
            telemetry_failures: 0,
            nav_faults: 0,
            sensor_faults: 0,
        }
    }

    pub fn ticks(&self) -> u64 { self.ticks }
    pub fn final_phase(&self) -> Phase { self.final_phase }
    /// Every phase change with the (1-based) tick it happened on.
    pub fn transitions(&self) -> &[(u64, Transition)] { &self.transitions }
    pub fn goal_reached(&self) -> bool { self.goal_reached }
    pub fn telemetry_failures(&self) -> u64 { self.telemetry_failures }
    pub fn nav_faults(&self) -> u64 { self.nav_faults }
    pub fn sensor_faults(&self) -> u64 { self.sensor_faults }

    /// Tick on which `phase` was entered, if it was.
    pub fn entered_at(&self, phase: Phase) -> Option<u64> {
        self.transitions.iter().find(|(_, t)| t.to == phase).map(|(tick, _)| *tick)
    }
}

/// The fixed-tick mission driver. Owns every device handle for the whole run.
///
/// Each tick runs to completion: read sensors, step the phase machine, append telemetry,
/// actuate. Cancellation is only observed between ticks. Motors are zeroed on every way out
/// of [`Self::run`], including unwinding, through the owned [`MotorGuard`].
pub struct MissionLoop<M: MotorDrive, T: Ticker> {
    sensors: SensorSuite,
    motors: MotorGuard<M>,
    machine: PhaseStateMachine,
    telemetry: Option<TelemetryLogger>,
    ticker: T,
    report: MissionReport,
}

impl<M: MotorDrive, T: Ticker> MissionLoop<M, T> {
    /// Arms the mission: the `WAITING` countdown starts now.
    pub fn new(
        config: &MissionConfig,
        sensors: SensorSuite,
        motors: M,
        telemetry: Option<TelemetryLogger>,
        ticker: T,
    ) -> Self {
        Self {
            sensors,
            motors: MotorGuard::new(motors),
            machine: PhaseStateMachine::new(config, Instant::now()),
            telemetry,
            ticker,
            report: MissionReport::new(),
        }
    }

    pub fn phase(&self) -> Phase { self.machine.phase() }

    /// Runs ticks until `c_tok` is cancelled.
    ///
    /// # Returns
    /// - The `MissionReport` after a requested stop. `DONE` does not end the loop on its own,
    ///   telemetry keeps being recorded until the stop request.
    /// - `MissionError::Actuator` if the motor driver failed. Zero throttle has been attempted.
    pub async fn run(mut self, c_tok: CancellationToken) -> Result<MissionReport, MissionError> {
        info!("Mission armed in {}, telemetry {}", self.phase(), match &self.telemetry {
            Some(t) => t.path().display().to_string(),
            None => "disabled".to_string(),
        });
        loop {
            tokio::select! {
                biased;
                () = c_tok.cancelled() => break,
                () = self.ticker.tick() => {}
            }
            if let Err(e) = self.run_tick().await {
                error!("Motor driver failed in {}: {e:?}, shutting down", self.phase());
                if let Err(stop_err) = self.motors.stop() {
                    error!("Zero throttle could not be confirmed: {stop_err:?}");
                }
                return Err(e);
            }
        }
        info!("Stop requested in {}, zeroing motors", self.phase());
        self.motors.stop().map_err(MissionError::Actuator)?;
        Ok(self.finish())
    }

    fn finish(mut self) -> MissionReport {
        self.report.final_phase = self.machine.phase();
        self.report.goal_reached = self.machine.goal_reached();
        self.report.sensor_faults = self.sensors.faults();
        info!(
            "Mission ended in {} after {} ticks (goal reached: {}, telemetry failures: {})",
            self.report.final_phase,
            self.report.ticks,
            self.report.goal_reached,
            self.report.telemetry_failures
        );
        self.report.clone()
    }

    async fn run_tick(&mut self) -> Result<(), MissionError> {
        let snapshot = self.sensors.read_all(self.machine.phase().needs_position()).await;
        let input = PhaseInput {
            altitude_m: snapshot.altitude(),
            position: snapshot.fix.position(),
            heading_deg: snapshot.euler.heading,
            has_fix: snapshot.fix.has_fix(),
        };
        let step = self.machine.step(Instant::now(), &input);
        self.report.ticks += 1;
        self.announce(&step, &snapshot);

        if step.arrived {
            let at = Utc::now().format("%Y-%m-%d %H:%M:%S");
            info!("GOAL REACHED at {at}, {:.1} m from target. Holding position, logging continues", step.distance_m);
            self.record_marker(&format!("GOAL REACHED at {at}"));
        }
        let nav = NavSnapshot {
            position: snapshot.fix.position(),
            distance_m: step.distance_m,
            bearing_deg: step.bearing_deg,
            command: step.command,
            fix_valid: snapshot.fix.has_fix(),
        };
        self.record(&TelemetryRecord::new(Utc::now(), step.phase, snapshot, nav));

        self.motors.apply(step.command).map_err(MissionError::Actuator)
    }

    fn announce(&mut self, step: &PhaseStep, snapshot: &SensorSnapshot) {
        if let Some(t) = step.transition {
            self.report.transitions.push((self.report.ticks, t));
            match t.to {
                Phase::DropDetect => info!("Countdown over after {:.0}s, watching for the drop", t.trigger),
                Phase::LandingDetect => info!("Drop detected, descended {:.1} m", t.trigger),
                Phase::Driving => info!("Landing detected, altitude band {:.2} m. Driving", t.trigger),
                Phase::Done if self.machine.goal_reached() => {
                    info!("Drive finished at the goal after {:.1}s", t.trigger);
                }
                Phase::Done => warn!("Drive time limit reached after {:.1}s, stopping", t.trigger),
                Phase::Waiting => {}
            }
        }
        if let Some(e) = step.nav_fault {
            self.report.nav_faults += 1;
            warn!("Navigation input rejected ({e}), holding position");
        }
        match step.phase {
            Phase::Driving if !snapshot.fix.has_fix() => nav!("Searching for GPS fix, motors stopped"),
            Phase::Driving => nav!(
                "RUN {:.1} m | heading {:.0}° | bearing {:.0}° | L {:.2} R {:.2}",
                step.distance_m,
                snapshot.euler.heading,
                step.bearing_deg,
                step.command.left(),
                step.command.right()
            ),
            phase => event!("{phase}: altitude {:.2} m, window {}", snapshot.altitude_m, self.machine.history().len()),
        }
    }

    fn record(&mut self, record: &TelemetryRecord) {
        let Some(logger) = self.telemetry.as_mut() else {
            return;
        };
        if let Err(e) = logger.append(record) {
            self.report.telemetry_failures += 1;
            error!("Telemetry append failed ({e:?}), control continues");
        }
    }

    fn record_marker(&mut self, text: &str) {
        let Some(logger) = self.telemetry.as_mut() else {
            return;
        };
        if let Err(e) = logger.append_marker(text) {
            self.report.telemetry_failures += 1;
            error!("Telemetry marker failed ({e:?})");
        }
    }
}
