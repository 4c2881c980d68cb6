//! Activity network with structural integrity guarantees.
//!
//! Predecessor lists are the single source of truth; successor lists are a
//! projection rebuilt wholesale after every mutation. Cycle detection is not
//! this layer's job: the schedule calculator guards against cycles so that a
//! bad edit degrades the schedule instead of wedging the graph.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Activity;

/// Errors from structural graph edits.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("activity {0:?} already exists")]
    DuplicateId(String),
    #[error("activity {0:?} does not exist")]
    NotFound(String),
    #[error("unknown predecessor {0:?}")]
    UnknownPredecessor(String),
    #[error("activity {0:?} cannot depend on itself")]
    SelfDependency(String),
    #[error("{predecessor:?} is already a predecessor of {successor:?}")]
    DuplicateDependency {
        predecessor: String,
        successor: String,
    },
    #[error("invalid duration {0}: must be non-negative")]
    InvalidDuration(f64),
}

/// Mapping of activity id to node, with deterministic insertion order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActivityGraph {
    activities: FxHashMap<String, Activity>,
    /// Insertion order, so traversal and event ordering are reproducible.
    order: Vec<String>,
}

impl ActivityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.activities.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Activity> {
        self.activities.get(id)
    }

    /// Activity ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Activities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.order.iter().filter_map(|id| self.activities.get(id))
    }

    /// Insert a new activity and rebuild the successor projection.
    pub fn add_activity(
        &mut self,
        id: impl Into<String>,
        duration: f64,
        predecessors: Vec<String>,
    ) -> Result<(), GraphError> {
        let id = id.into();
        if self.activities.contains_key(&id) {
            return Err(GraphError::DuplicateId(id));
        }
        if duration < 0.0 {
            return Err(GraphError::InvalidDuration(duration));
        }
        for pred in &predecessors {
            if !self.activities.contains_key(pred) {
                return Err(GraphError::UnknownPredecessor(pred.clone()));
            }
        }

        let mut unique_preds: Vec<String> = Vec::with_capacity(predecessors.len());
        for pred in predecessors {
            if !unique_preds.contains(&pred) {
                unique_preds.push(pred);
            }
        }

        self.activities
            .insert(id.clone(), Activity::new(id.clone(), duration, unique_preds));
        self.order.push(id);
        self.rebuild_successors();
        Ok(())
    }

    /// Remove an activity and strip it from every other node's dependency
    /// lists.
    pub fn remove_activity(&mut self, id: &str) -> Result<(), GraphError> {
        if self.activities.remove(id).is_none() {
            return Err(GraphError::NotFound(id.to_string()));
        }
        self.order.retain(|existing| existing != id);
        for activity in self.activities.values_mut() {
            activity.predecessors.retain(|pred| pred != id);
        }
        self.rebuild_successors();
        Ok(())
    }

    /// Record `predecessor -> successor` and rebuild the projection.
    ///
    /// Deliberately does not check whether the edge closes a cycle; the
    /// schedule calculator detects and recovers from cycles.
    pub fn add_dependency(&mut self, predecessor: &str, successor: &str) -> Result<(), GraphError> {
        if predecessor == successor {
            return Err(GraphError::SelfDependency(predecessor.to_string()));
        }
        if !self.activities.contains_key(predecessor) {
            return Err(GraphError::NotFound(predecessor.to_string()));
        }
        let Some(activity) = self.activities.get_mut(successor) else {
            return Err(GraphError::NotFound(successor.to_string()));
        };
        if activity.predecessors.iter().any(|p| p == predecessor) {
            return Err(GraphError::DuplicateDependency {
                predecessor: predecessor.to_string(),
                successor: successor.to_string(),
            });
        }
        activity.predecessors.push(predecessor.to_string());
        self.rebuild_successors();
        Ok(())
    }

    /// Change an activity's duration. Milestones may be 0.
    pub fn set_duration(&mut self, id: &str, duration: f64) -> Result<(), GraphError> {
        if duration < 0.0 {
            return Err(GraphError::InvalidDuration(duration));
        }
        let Some(activity) = self.activities.get_mut(id) else {
            return Err(GraphError::NotFound(id.to_string()));
        };
        activity.duration = duration;
        Ok(())
    }

    /// Recompute every successor list strictly from predecessor lists.
    /// Idempotent; called after every structural mutation.
    pub fn rebuild_successors(&mut self) {
        let mut links: Vec<(String, String)> = Vec::new();
        for id in &self.order {
            if let Some(activity) = self.activities.get(id) {
                for pred in &activity.predecessors {
                    links.push((pred.clone(), id.clone()));
                }
            }
        }

        for activity in self.activities.values_mut() {
            activity.successors.clear();
        }
        for (pred, succ) in links {
            if let Some(activity) = self.activities.get_mut(&pred) {
                if !activity.successors.contains(&succ) {
                    activity.successors.push(succ);
                }
            }
        }
    }

    /// First unused spreadsheet-style id token (A..Z, AA, AB, ...).
    pub fn generate_unique_id(&self) -> String {
        let mut counter = 0usize;
        loop {
            let candidate = number_to_letters(counter);
            if !self.activities.contains_key(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// 0 -> "A", 25 -> "Z", 26 -> "AA", like spreadsheet column names.
fn number_to_letters(mut n: usize) -> String {
    let mut out = String::new();
    loop {
        out.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    out
}
