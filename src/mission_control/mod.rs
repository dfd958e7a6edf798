//! Mission sequencing: configuration, the forward-only phase machine and the fixed-tick loop
//! driving it.

mod altitude_history;
mod mission_config;
mod mission_loop;
mod phase;
mod phase_machine;

pub use altitude_history::AltitudeHistory;
pub use mission_config::{ConfigError, MissionConfig};
pub use mission_loop::{IntervalTicker, MissionError, MissionLoop, MissionReport, Ticker};
pub use phase::Phase;
pub use phase_machine::{PhaseInput, PhaseStateMachine, PhaseStep, Transition};
