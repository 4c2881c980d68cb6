//! Critical path scheduling engine with a fill/drain simulation.
//!
//! Models a project-activity network, computes its CPM schedule (earliest
//! and latest start/finish times, slack, project duration, critical path),
//! and drives a time-stepped simulation that fills activities forward and
//! drains them backward. Rendering and interaction belong to the host: it
//! feeds graph edits in through [`ProjectEngine`] and reads the computed
//! schedule and live simulation snapshot back out.

pub mod config;
pub mod cpm;
pub mod engine;
pub mod graph;
pub mod interner;
pub mod logging;
pub mod models;
pub mod simulation;

pub use config::{SimulationConfig, SPEED_MULTIPLIER_MAX, SPEED_MULTIPLIER_MIN};
pub use cpm::{compute_schedule, ActivityTiming, Schedule, CRITICAL_SLACK_EPSILON};
pub use engine::{AnchorReport, EngineError, ProjectEngine, END_ID, START_ID};
pub use graph::{ActivityGraph, GraphError};
pub use models::{Activity, ActivityState, Direction, SimEvent};
pub use simulation::{step, ActivityRun, SimulationState};
