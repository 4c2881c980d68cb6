//! Engine facade tying together the graph, the schedule, and the simulation.
//!
//! Owns the control flow required by the host render layer: every successful
//! edit recomputes the schedule wholesale and discards the simulation; edits
//! are rejected outright while a run is active.

use thiserror::Error;

use crate::config::SimulationConfig;
use crate::cpm::{compute_schedule, Schedule};
use crate::graph::{ActivityGraph, GraphError};
use crate::log_changes;
use crate::models::{ActivityState, Direction};
use crate::simulation::{step, SimulationState};

/// Id of the milestone inserted ahead of all source activities.
pub const START_ID: &str = "START";
/// Id of the milestone inserted after all sink activities.
pub const END_ID: &str = "END";

/// Errors surfaced to the host layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("cannot edit the network while a run is active")]
    EditDuringRun,
    #[error("backward run requires every activity to be completed")]
    PrerequisiteNotMet,
}

/// What [`ProjectEngine::add_start_end_anchors`] inserted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnchorReport {
    pub added_start: bool,
    pub added_end: bool,
}

/// The scheduling engine behind the fill/drain visualization.
#[derive(Clone, Debug, Default)]
pub struct ProjectEngine {
    graph: ActivityGraph,
    schedule: Schedule,
    sim: SimulationState,
    config: SimulationConfig,
}

impl ProjectEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    // ---- queries ----

    pub fn graph(&self) -> &ActivityGraph {
        &self.graph
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn simulation(&self) -> &SimulationState {
        &self.sim
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Advisory "waiting due to slack" rendering flag for one activity.
    pub fn waiting_on_slack(&self, id: &str) -> bool {
        self.sim.waiting_on_slack(&self.graph, &self.schedule, id)
    }

    /// Clock value for display; runs backwards during an unfill run.
    pub fn display_time(&self) -> f64 {
        self.sim.display_time(&self.schedule)
    }

    pub fn generate_unique_id(&self) -> String {
        self.graph.generate_unique_id()
    }

    // ---- structural edits ----

    pub fn add_activity(
        &mut self,
        id: &str,
        duration: f64,
        predecessors: &[&str],
    ) -> Result<(), EngineError> {
        self.ensure_idle()?;
        let preds = predecessors.iter().map(|p| p.to_string()).collect();
        self.graph.add_activity(id, duration, preds)?;
        self.after_edit();
        Ok(())
    }

    pub fn remove_activity(&mut self, id: &str) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.graph.remove_activity(id)?;
        self.after_edit();
        Ok(())
    }

    pub fn add_dependency(&mut self, predecessor: &str, successor: &str) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.graph.add_dependency(predecessor, successor)?;
        self.after_edit();
        Ok(())
    }

    pub fn set_duration(&mut self, id: &str, duration: f64) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.graph.set_duration(id, duration)?;
        self.after_edit();
        Ok(())
    }

    /// Insert `count` generated-id activities of duration 1 with no
    /// predecessors. Returns the ids created.
    pub fn add_batch_activities(&mut self, count: usize) -> Result<Vec<String>, EngineError> {
        self.ensure_idle()?;
        let mut created = Vec::with_capacity(count);
        for _ in 0..count {
            let id = self.graph.generate_unique_id();
            self.graph.add_activity(id.clone(), 1.0, Vec::new())?;
            created.push(id);
        }
        self.after_edit();
        Ok(created)
    }

    /// Insert zero-duration START/END milestones around the network.
    ///
    /// START is added only when at least two activities have no predecessors
    /// and no START exists; END mirrors that for sinks. Source and sink sets
    /// are taken from the graph before either milestone is inserted.
    pub fn add_start_end_anchors(&mut self) -> Result<AnchorReport, EngineError> {
        self.ensure_idle()?;

        let sources: Vec<String> = self
            .graph
            .iter()
            .filter(|a| a.predecessors.is_empty())
            .map(|a| a.id.clone())
            .collect();
        let sinks: Vec<String> = self
            .graph
            .iter()
            .filter(|a| a.successors.is_empty())
            .map(|a| a.id.clone())
            .collect();

        let mut report = AnchorReport::default();

        if sources.len() >= 2 && !self.graph.contains(START_ID) {
            self.graph.add_activity(START_ID, 0.0, Vec::new())?;
            for source in &sources {
                self.graph.add_dependency(START_ID, source)?;
            }
            report.added_start = true;
        }

        if sinks.len() >= 2 && !self.graph.contains(END_ID) {
            self.graph
                .add_activity(END_ID, 0.0, sinks.clone())?;
            report.added_end = true;
        }

        if report.added_start || report.added_end {
            self.after_edit();
        }
        Ok(report)
    }

    // ---- run control ----

    /// Begin a forward ("fill") run from a fresh time-0 simulation.
    pub fn start_forward_run(&mut self) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.sim = SimulationState::for_graph(&self.graph);
        self.sim.direction = Direction::Forward;
        log_changes!(self.config.verbosity, "forward run started");
        Ok(())
    }

    /// Begin a backward ("unfill") run. Only startable once every activity
    /// is completed; otherwise fails without mutating any activity state.
    pub fn start_backward_run(&mut self) -> Result<(), EngineError> {
        // A running simulation never has every activity completed, so this
        // check also rejects requests made mid-run.
        if !self.sim.all_in(ActivityState::Completed) || self.graph.is_empty() {
            return Err(EngineError::PrerequisiteNotMet);
        }
        for run in self.sim.runs.values_mut() {
            run.state = ActivityState::Unfilling;
            run.unfill_start_time = None;
        }
        self.sim.backward_anchor = Some(self.sim.current_time);
        self.sim.direction = Direction::Backward;
        self.sim.paused = false;
        log_changes!(self.config.verbosity, "backward run started");
        Ok(())
    }

    /// Freeze the clock and all transition evaluation. No-op when idle.
    pub fn pause(&mut self) {
        if self.sim.is_running() {
            self.sim.paused = true;
        }
    }

    /// Continue exactly where the run left off. No-op when idle.
    pub fn resume(&mut self) {
        if self.sim.is_running() {
            self.sim.paused = false;
        }
    }

    /// Discard the simulation and return to time 0. The graph and schedule
    /// are untouched.
    pub fn reset(&mut self) {
        self.sim = SimulationState::for_graph(&self.graph);
    }

    /// Advance the simulation by one frame.
    pub fn tick(&mut self) -> &SimulationState {
        self.sim = step(&self.sim, &self.graph, &self.schedule, &self.config);
        &self.sim
    }

    /// Set the clock speed, clamped to the accepted range. Allowed while a
    /// run is active.
    pub fn set_speed_multiplier(&mut self, multiplier: f64) {
        self.config.set_speed_multiplier(multiplier);
    }

    // ---- internals ----

    fn ensure_idle(&self) -> Result<(), EngineError> {
        if self.sim.is_running() {
            return Err(EngineError::EditDuringRun);
        }
        Ok(())
    }

    fn after_edit(&mut self) {
        self.schedule = compute_schedule(&self.graph, self.config.verbosity);
        self.sim = SimulationState::for_graph(&self.graph);
    }
}
