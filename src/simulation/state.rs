//! Simulation snapshot: clock, direction, and per-activity runtime state.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cpm::{Schedule, CRITICAL_SLACK_EPSILON};
use crate::graph::ActivityGraph;
use crate::models::{ActivityState, Direction, SimEvent};

/// Runtime state of one activity within a run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ActivityRun {
    pub state: ActivityState,
    /// Fill level in [0, 1].
    pub progress: f64,
    pub start_time: Option<f64>,
    pub finish_time: Option<f64>,
    pub unfill_start_time: Option<f64>,
}

impl Default for ActivityRun {
    fn default() -> Self {
        Self {
            state: ActivityState::NotStarted,
            progress: 0.0,
            start_time: None,
            finish_time: None,
            unfill_start_time: None,
        }
    }
}

/// Immutable-per-tick snapshot of the whole simulation.
///
/// Discarded and rebuilt at time 0 on every structural edit and at the start
/// of a forward run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationState {
    /// Simulation clock; strictly increases while a run is active.
    pub current_time: f64,
    pub direction: Direction,
    pub paused: bool,
    /// Clock value when the backward run began, for display-time mapping.
    pub backward_anchor: Option<f64>,
    /// Per-activity runtime state.
    pub runs: FxHashMap<String, ActivityRun>,
    /// Append-only start events, at most one per activity.
    pub start_events: Vec<SimEvent>,
    /// Append-only finish events, at most one per activity.
    pub end_events: Vec<SimEvent>,
    /// Set once the forward run reaches the fully-completed terminal state.
    pub project_complete: bool,
}

impl SimulationState {
    /// Fresh snapshot at time 0 with every activity `NotStarted`.
    pub fn for_graph(graph: &ActivityGraph) -> Self {
        let mut runs: FxHashMap<String, ActivityRun> =
            FxHashMap::with_capacity_and_hasher(graph.len(), Default::default());
        for activity in graph.iter() {
            runs.insert(activity.id.clone(), ActivityRun::default());
        }
        Self {
            runs,
            ..Self::default()
        }
    }

    pub fn run(&self, id: &str) -> Option<&ActivityRun> {
        self.runs.get(id)
    }

    pub fn state_of(&self, id: &str) -> Option<ActivityState> {
        self.runs.get(id).map(|r| r.state)
    }

    pub fn is_running(&self) -> bool {
        self.direction != Direction::Idle
    }

    /// True when every activity is in `state`. Vacuously true for an empty
    /// graph, matching the terminal checks.
    pub fn all_in(&self, state: ActivityState) -> bool {
        self.runs.values().all(|r| r.state == state)
    }

    /// An activity can start filling once every predecessor is completed.
    pub fn can_start(&self, graph: &ActivityGraph, id: &str) -> bool {
        let Some(activity) = graph.get(id) else {
            return false;
        };
        activity
            .predecessors
            .iter()
            .all(|pred| self.state_of(pred) == Some(ActivityState::Completed))
    }

    /// An activity can start draining once every successor is unfilled;
    /// sinks qualify immediately.
    pub fn can_unfill(&self, graph: &ActivityGraph, id: &str) -> bool {
        let Some(activity) = graph.get(id) else {
            return false;
        };
        activity
            .successors
            .iter()
            .all(|succ| self.state_of(succ) == Some(ActivityState::Unfilled))
    }

    /// Advisory rendering flag: a completed activity with positive slack
    /// whose successors are still blocked on other, unfinished predecessors.
    /// Purely derived, never a state of its own.
    pub fn waiting_on_slack(&self, graph: &ActivityGraph, schedule: &Schedule, id: &str) -> bool {
        if self.state_of(id) != Some(ActivityState::Completed) {
            return false;
        }
        let has_slack = schedule
            .slack(id)
            .is_some_and(|s| s > CRITICAL_SLACK_EPSILON);
        if !has_slack {
            return false;
        }
        let Some(activity) = graph.get(id) else {
            return false;
        };
        activity.successors.iter().any(|succ| {
            self.state_of(succ) == Some(ActivityState::NotStarted) && !self.can_start(graph, succ)
        })
    }

    /// Clock value for display. During a backward run the clock keeps
    /// increasing, but the picture runs from the project end back to 0.
    pub fn display_time(&self, schedule: &Schedule) -> f64 {
        match (self.direction, self.backward_anchor) {
            (Direction::Backward, Some(anchor)) => {
                let elapsed = self.current_time - anchor;
                (schedule.project_duration - elapsed).max(0.0)
            }
            _ => self.current_time,
        }
    }

    /// Record a start event unless one exists for this activity.
    pub(crate) fn record_start(&mut self, id: &str, time: f64) {
        if !self.start_events.iter().any(|e| e.activity_id == id) {
            self.start_events.push(SimEvent {
                activity_id: id.to_string(),
                time,
            });
        }
    }

    /// Record a finish event unless one exists for this activity.
    pub(crate) fn record_end(&mut self, id: &str, time: f64) {
        if !self.end_events.iter().any(|e| e.activity_id == id) {
            self.end_events.push(SimEvent {
                activity_id: id.to_string(),
                time,
            });
        }
    }
}
