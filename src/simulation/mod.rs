//! Fill/unfill simulation driven by the computed schedule.
//!
//! The simulation is a snapshot plus a pure transition function: the host
//! loop owns timing and calls [`step`] once per frame, replacing its snapshot
//! with the returned one. No hidden shared mutable state.

mod state;
mod step;

pub use state::{ActivityRun, SimulationState};
pub use step::step;
