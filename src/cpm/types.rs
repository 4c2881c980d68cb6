//! Types produced by the forward and backward passes.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Slack tolerance for criticality: durations and times are floating point,
/// so exact equality with zero is unreliable.
pub const CRITICAL_SLACK_EPSILON: f64 = 0.001;

/// Per-activity timing information.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityTiming {
    /// Earliest possible start time (forward pass).
    pub earliest_start: f64,
    /// Earliest possible finish time (forward pass).
    pub earliest_finish: f64,
    /// Latest allowable start time (backward pass).
    pub latest_start: f64,
    /// Latest allowable finish time (backward pass).
    pub latest_finish: f64,
    /// Slack = latest_start - earliest_start.
    pub slack: f64,
}

impl ActivityTiming {
    pub fn is_critical(&self) -> bool {
        self.slack.abs() < CRITICAL_SLACK_EPSILON
    }
}

/// Complete schedule for one graph snapshot.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Schedule {
    /// Timing per activity id.
    pub timings: FxHashMap<String, ActivityTiming>,
    /// Maximum earliest finish across all activities; 0 for an empty graph.
    /// Always a finite non-negative number, even for degenerate graphs.
    pub project_duration: f64,
    /// Activities found on a dependency cycle; empty for a valid DAG. The
    /// forward pass zeroes their contribution instead of failing.
    pub cycle_members: Vec<String>,
}

impl Schedule {
    pub fn timing(&self, id: &str) -> Option<&ActivityTiming> {
        self.timings.get(id)
    }

    pub fn slack(&self, id: &str) -> Option<f64> {
        self.timings.get(id).map(|t| t.slack)
    }

    pub fn is_critical(&self, id: &str) -> bool {
        self.timings.get(id).is_some_and(|t| t.is_critical())
    }

    pub fn has_cycle(&self) -> bool {
        !self.cycle_members.is_empty()
    }

    /// Critical activity ids, sorted for deterministic output.
    pub fn critical_activities(&self) -> Vec<&str> {
        let mut critical: Vec<&str> = self
            .timings
            .iter()
            .filter(|(_, t)| t.is_critical())
            .map(|(id, _)| id.as_str())
            .collect();
        critical.sort_unstable();
        critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_critical() {
        let timing = ActivityTiming {
            earliest_start: 0.0,
            earliest_finish: 5.0,
            latest_start: 0.0,
            latest_finish: 5.0,
            slack: 0.0,
        };
        assert!(timing.is_critical());

        let timing_with_slack = ActivityTiming {
            earliest_start: 0.0,
            earliest_finish: 5.0,
            latest_start: 2.0,
            latest_finish: 7.0,
            slack: 2.0,
        };
        assert!(!timing_with_slack.is_critical());

        // Float noise inside the tolerance still counts as critical.
        let noisy = ActivityTiming {
            slack: 1e-7,
            ..timing
        };
        assert!(noisy.is_critical());
    }

    #[test]
    fn test_empty_schedule() {
        let schedule = Schedule::default();
        assert!((schedule.project_duration - 0.0).abs() < 1e-9);
        assert!(!schedule.has_cycle());
        assert!(schedule.critical_activities().is_empty());
    }
}
