//! Dense integer indexing of activity ids.
//!
//! The pass algorithms work over `Vec` storage keyed by `u32` indices instead
//! of hashing id strings on every lookup.

use rustc_hash::FxHashMap;

use crate::graph::ActivityGraph;

/// Interned activity id (u32 for compact storage and fast hashing).
pub type ActivityId = u32;

/// Bidirectional mapping between activity id strings and dense integers.
#[derive(Debug, Clone, Default)]
pub struct ActivityIndex {
    to_int: FxHashMap<String, ActivityId>,
    from_int: Vec<String>,
}

impl ActivityIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_int: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_int: Vec::with_capacity(capacity),
        }
    }

    /// Index every activity of a graph in its insertion order, so traversal
    /// results are deterministic.
    pub fn from_graph(graph: &ActivityGraph) -> Self {
        let mut index = Self::with_capacity(graph.len());
        for activity in graph.iter() {
            index.insert(&activity.id);
        }
        index
    }

    /// Intern an id string, returning its integer index.
    /// If already interned, returns the existing index.
    pub fn insert(&mut self, id: &str) -> ActivityId {
        if let Some(&idx) = self.to_int.get(id) {
            return idx;
        }
        let idx = self.from_int.len() as ActivityId;
        self.from_int.push(id.to_string());
        self.to_int.insert(id.to_string(), idx);
        idx
    }

    /// Get the integer index for an id string, if it exists.
    #[inline]
    pub fn get(&self, id: &str) -> Option<ActivityId> {
        self.to_int.get(id).copied()
    }

    /// Get the id string for an integer index.
    #[inline]
    pub fn resolve(&self, idx: ActivityId) -> Option<&str> {
        self.from_int.get(idx as usize).map(|s| s.as_str())
    }

    /// Number of interned ids.
    pub fn len(&self) -> usize {
        self.from_int.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.from_int.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_resolve() {
        let mut index = ActivityIndex::with_capacity(4);

        let a = index.insert("A");
        let b = index.insert("B");
        let a_again = index.insert("A"); // duplicate

        assert_eq!(a, a_again); // same id = same index
        assert_ne!(a, b);

        assert_eq!(index.resolve(a), Some("A"));
        assert_eq!(index.resolve(b), Some("B"));
        assert_eq!(index.get("A"), Some(a));
        assert_eq!(index.get("nonexistent"), None);
    }

    #[test]
    fn test_from_graph_follows_insertion_order() {
        let mut graph = ActivityGraph::new();
        graph.add_activity("B", 1.0, vec![]).unwrap();
        graph.add_activity("A", 1.0, vec!["B".to_string()]).unwrap();

        let index = ActivityIndex::from_graph(&graph);
        assert_eq!(index.len(), 2);
        assert_eq!(index.resolve(0), Some("B"));
        assert_eq!(index.resolve(1), Some("A"));
    }
}
