//! Core data types for the activity network and simulation.

use serde::{Deserialize, Serialize};

/// An activity (node) in the project network.
///
/// `predecessors` is the authoritative dependency list. `successors` is a
/// pure projection of the predecessor lists of every other activity and is
/// rebuilt wholesale by [`crate::graph::ActivityGraph::rebuild_successors`]
/// after any structural mutation; it is never edited directly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Activity {
    /// Unique id token.
    pub id: String,
    /// Non-negative duration in simulation time units; 0 denotes a milestone.
    pub duration: f64,
    /// Ids of activities that must complete before this one starts.
    pub predecessors: Vec<String>,
    /// Derived inverse of the predecessor relation.
    pub successors: Vec<String>,
}

impl Activity {
    pub fn new(id: impl Into<String>, duration: f64, predecessors: Vec<String>) -> Self {
        Self {
            id: id.into(),
            duration,
            predecessors,
            successors: Vec::new(),
        }
    }

    /// Zero-duration activities (e.g. START/END anchors) fill and drain
    /// instantly.
    pub fn is_milestone(&self) -> bool {
        self.duration == 0.0
    }
}

/// Lifecycle state of an activity during a simulation run.
///
/// The forward machine moves `NotStarted -> InProgress -> Completed`; the
/// backward machine moves `Completed -> Unfilling -> Unfilled`. `Completed`
/// is the pivot shared by both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityState {
    NotStarted,
    InProgress,
    Completed,
    Unfilling,
    Unfilled,
}

/// Direction of the active simulation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Idle,
    Forward,
    Backward,
}

/// Timeline event: the clock value at which an activity started or finished
/// filling. At most one per activity per event list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub activity_id: String,
    pub time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milestone() {
        let start = Activity::new("START", 0.0, vec![]);
        assert!(start.is_milestone());

        let a = Activity::new("A", 3.0, vec!["START".to_string()]);
        assert!(!a.is_milestone());
    }

    #[test]
    fn test_direction_default_is_idle() {
        assert_eq!(Direction::default(), Direction::Idle);
    }
}
