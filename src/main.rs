#![allow(dead_code, clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod devices;
mod logger;
mod mission_control;
mod navigation;
mod telemetry;

use crate::devices::{NmeaGpsReceiver, SensorSuite, SimScenario, SimulatedCanSat};
use crate::mission_control::{IntervalTicker, MissionConfig, MissionLoop, Phase};
use crate::telemetry::TelemetryLogger;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = MissionConfig::from_env();
    if let Err(e) = config.validate() {
        fatal!("Invalid mission configuration: {e:?}");
    }
    info!(
        "Target {} (goal radius {:.1} m), arming countdown {}s",
        config.target,
        config.goal_radius_m,
        config.wait_duration.as_secs()
    );

    let c_tok = CancellationToken::new();
    spawn_stop_listener(c_tok.clone());

    let sim = SimulatedCanSat::new(SimScenario::for_mission(&config));
    let sensors = init_sensors(&config, &sim);
    let telemetry = TelemetryLogger::open_in_dir(&config.log_dir)
        .inspect_err(|e| error!("Telemetry unavailable ({e:?}), continuing without a log file"))
        .ok();

    let mission = MissionLoop::new(
        &config,
        sensors,
        sim.motors(),
        telemetry,
        IntervalTicker::new(config.tick_period),
    );
    match mission.run(c_tok).await {
        Ok(report) => {
            for (tick, t) in report.transitions() {
                log!("tick {tick:>6}: {} -> {} ({:.2})", t.from, t.to, t.trigger);
            }
            if report.final_phase() != Phase::Done {
                warn!("Stopped before the mission finished, last phase {}", report.final_phase());
            }
            log!(
                "{} ticks, {} sensor faults, {} navigation faults, {} telemetry failures",
                report.ticks(),
                report.sensor_faults(),
                report.nav_faults(),
                report.telemetry_failures()
            );
        }
        Err(e) => {
            error!("Mission aborted: {e:?}");
            std::process::exit(1);
        }
    }
}

/// Barometer and IMU come from the simulated vehicle. The position source is the serial NMEA
/// receiver at `gps_port` if one is configured and can be opened.
fn init_sensors(config: &MissionConfig, sim: &SimulatedCanSat) -> SensorSuite {
    let suite = SensorSuite::new(config.tick_period, config.gps_timeout + config.tick_period)
        .with_pressure(sim.barometer())
        .with_orientation(sim.imu());
    let Some(port) = &config.gps_port else {
        return suite.with_position(sim.gps());
    };
    match NmeaGpsReceiver::open(port, config.gps_timeout) {
        Ok(gps) => {
            info!("Reading NMEA from {}", port.display());
            suite.with_position(gps)
        }
        Err(e) => {
            error!("Could not open GPS port {}: {e}, running without position", port.display());
            suite
        }
    }
}

/// Cancels `c_tok` on Ctrl-C or SIGTERM.
fn spawn_stop_listener(c_tok: CancellationToken) {
    tokio::spawn(async move {
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                error!("SIGTERM handler unavailable: {e}");
                let _ = tokio::signal::ctrl_c().await;
                c_tok.cancel();
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Interrupt received"),
            _ = term.recv() => info!("SIGTERM received"),
        }
        c_tok.cancel();
    });
}
