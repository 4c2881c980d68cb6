//! Forward and backward passes over the activity network.

use rustc_hash::FxHashMap;

use crate::graph::ActivityGraph;
use crate::interner::{ActivityId, ActivityIndex};
use crate::log_changes;

use super::types::{ActivityTiming, Schedule, CRITICAL_SLACK_EPSILON};

/// Dense per-activity data extracted from the graph for the passes.
/// All lookups use direct array indexing keyed by interned ids.
struct PassData {
    index: ActivityIndex,
    durations: Vec<f64>,
    preds: Vec<Vec<ActivityId>>,
    succs: Vec<Vec<ActivityId>>,
}

impl PassData {
    fn new(graph: &ActivityGraph) -> Self {
        let index = ActivityIndex::from_graph(graph);
        let n = index.len();

        let mut durations = vec![0.0; n];
        let mut preds: Vec<Vec<ActivityId>> = vec![Vec::new(); n];
        let mut succs: Vec<Vec<ActivityId>> = vec![Vec::new(); n];

        for activity in graph.iter() {
            if let Some(idx) = index.get(&activity.id) {
                durations[idx as usize] = activity.duration;
                for pred in &activity.predecessors {
                    if let Some(pred_idx) = index.get(pred) {
                        preds[idx as usize].push(pred_idx);
                        succs[pred_idx as usize].push(idx);
                    }
                }
            }
        }

        Self {
            index,
            durations,
            preds,
            succs,
        }
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn name(&self, idx: ActivityId) -> &str {
        self.index.resolve(idx).unwrap_or("?")
    }
}

/// Three-color marking for the iterative depth-first walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

struct ForwardPass {
    earliest_start: Vec<f64>,
    earliest_finish: Vec<f64>,
    /// Resolution order: every activity appears after all of its (acyclic)
    /// predecessors.
    finish_order: Vec<ActivityId>,
    cycle_members: Vec<ActivityId>,
}

/// Compute earliest start/finish for every activity.
///
/// Explicit iterative depth-first traversal so arbitrary predecessor
/// orderings resolve correctly without recursion-depth concerns. A gray
/// node reached again mid-walk is a cycle member: its finish contribution
/// is taken as 0 and the walk continues, guaranteeing termination.
fn forward_pass(data: &PassData, verbosity: u8) -> ForwardPass {
    let n = data.len();
    let mut mark = vec![Mark::White; n];
    let mut earliest_start = vec![0.0; n];
    let mut earliest_finish = vec![0.0; n];
    let mut finish_order: Vec<ActivityId> = Vec::with_capacity(n);
    let mut cycle_members: Vec<ActivityId> = Vec::new();

    for root in 0..n as ActivityId {
        if mark[root as usize] != Mark::White {
            continue;
        }
        mark[root as usize] = Mark::Gray;
        // (activity, next predecessor to examine)
        let mut stack: Vec<(ActivityId, usize)> = vec![(root, 0)];

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if top.1 < data.preds[node as usize].len() {
                let pred = data.preds[node as usize][top.1];
                top.1 += 1;
                match mark[pred as usize] {
                    Mark::White => {
                        mark[pred as usize] = Mark::Gray;
                        stack.push((pred, 0));
                    }
                    Mark::Gray => {
                        // Back edge into the active path.
                        if !cycle_members.contains(&pred) {
                            cycle_members.push(pred);
                        }
                        log_changes!(
                            verbosity,
                            "cycle detected involving {}; treating its finish as 0",
                            data.name(pred)
                        );
                    }
                    Mark::Black => {}
                }
            } else {
                // All predecessors resolved; gray ones (cycle back edges)
                // contribute 0.
                let mut max_pred_finish = 0.0_f64;
                for &pred in &data.preds[node as usize] {
                    if mark[pred as usize] == Mark::Black {
                        max_pred_finish = max_pred_finish.max(earliest_finish[pred as usize]);
                    }
                }
                earliest_start[node as usize] = max_pred_finish;
                earliest_finish[node as usize] =
                    max_pred_finish + data.durations[node as usize];
                mark[node as usize] = Mark::Black;
                finish_order.push(node);
                stack.pop();
            }
        }
    }

    ForwardPass {
        earliest_start,
        earliest_finish,
        finish_order,
        cycle_members,
    }
}

struct BackwardPass {
    latest_start: Vec<f64>,
    latest_finish: Vec<f64>,
    slack: Vec<f64>,
    project_duration: f64,
}

/// Compute latest start/finish and slack. Requires the forward pass result.
fn backward_pass(data: &PassData, forward: &ForwardPass, verbosity: u8) -> BackwardPass {
    let n = data.len();

    let mut project_duration = forward
        .earliest_finish
        .iter()
        .copied()
        .fold(0.0_f64, f64::max);
    if !project_duration.is_finite() || project_duration < 0.0 {
        project_duration = 0.0;
    }

    let mut latest_start = vec![0.0; n];
    let mut latest_finish = vec![0.0; n];

    // Reverse resolution order puts every successor before its predecessor.
    for &node in forward.finish_order.iter().rev() {
        let succs = &data.succs[node as usize];
        let lf = if succs.is_empty() {
            project_duration
        } else {
            succs
                .iter()
                .map(|&s| latest_start[s as usize])
                .fold(f64::INFINITY, f64::min)
        };
        latest_finish[node as usize] = lf;
        latest_start[node as usize] = lf - data.durations[node as usize];
    }

    let mut slack = vec![0.0; n];
    for i in 0..n {
        slack[i] = latest_start[i] - forward.earliest_start[i];
        if slack[i] < -CRITICAL_SLACK_EPSILON {
            // Should not occur in a valid DAG; surfaced rather than silently
            // rendered wrong.
            log_changes!(
                verbosity,
                "negative slack {:.3} on {}",
                slack[i],
                data.name(i as ActivityId)
            );
        }
    }

    BackwardPass {
        latest_start,
        latest_finish,
        slack,
        project_duration,
    }
}

/// Compute the full schedule for a graph snapshot.
///
/// Pure and deterministic: the same graph always yields the same schedule.
/// Cycles never fail the computation; members are reported in
/// [`Schedule::cycle_members`] with their contribution zeroed.
pub fn compute_schedule(graph: &ActivityGraph, verbosity: u8) -> Schedule {
    let data = PassData::new(graph);
    let forward = forward_pass(&data, verbosity);
    let backward = backward_pass(&data, &forward, verbosity);

    let mut timings: FxHashMap<String, ActivityTiming> =
        FxHashMap::with_capacity_and_hasher(data.len(), Default::default());
    for idx in 0..data.len() {
        timings.insert(
            data.name(idx as ActivityId).to_string(),
            ActivityTiming {
                earliest_start: forward.earliest_start[idx],
                earliest_finish: forward.earliest_finish[idx],
                latest_start: backward.latest_start[idx],
                latest_finish: backward.latest_finish[idx],
                slack: backward.slack[idx],
            },
        );
    }

    let cycle_members = forward
        .cycle_members
        .iter()
        .map(|&idx| data.name(idx).to_string())
        .collect();

    Schedule {
        timings,
        project_duration: backward.project_duration,
        cycle_members,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preds(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    /// A(3) feeds B(2) and C(4); the critical path is A -> C.
    fn fork_graph() -> ActivityGraph {
        let mut graph = ActivityGraph::new();
        graph.add_activity("A", 3.0, vec![]).unwrap();
        graph.add_activity("B", 2.0, preds(&["A"])).unwrap();
        graph.add_activity("C", 4.0, preds(&["A"])).unwrap();
        graph
    }

    #[test]
    fn test_fork_network_timings() {
        let schedule = compute_schedule(&fork_graph(), 0);

        let a = schedule.timing("A").unwrap();
        let b = schedule.timing("B").unwrap();
        let c = schedule.timing("C").unwrap();

        assert!((a.earliest_start - 0.0).abs() < 1e-9);
        assert!((b.earliest_start - 3.0).abs() < 1e-9);
        assert!((c.earliest_start - 3.0).abs() < 1e-9);
        assert!((a.earliest_finish - 3.0).abs() < 1e-9);
        assert!((b.earliest_finish - 5.0).abs() < 1e-9);
        assert!((c.earliest_finish - 7.0).abs() < 1e-9);
        assert!((schedule.project_duration - 7.0).abs() < 1e-9);

        assert!((a.slack - 0.0).abs() < 1e-9);
        assert!((b.slack - 2.0).abs() < 1e-9);
        assert!((c.slack - 0.0).abs() < 1e-9);
        assert_eq!(schedule.critical_activities(), vec!["A", "C"]);
        assert!(!schedule.has_cycle());
    }

    #[test]
    fn test_pass_identities() {
        let mut graph = fork_graph();
        graph.add_activity("D", 1.0, preds(&["B", "C"])).unwrap();
        let schedule = compute_schedule(&graph, 0);

        for id in ["A", "B", "C", "D"] {
            let t = schedule.timing(id).unwrap();
            let duration = graph.get(id).unwrap().duration;
            assert!(t.earliest_finish >= t.earliest_start);
            assert!((t.earliest_finish - (t.earliest_start + duration)).abs() < 1e-9);
            assert!(t.latest_finish >= t.latest_start);
            assert!(t.slack >= -1e-9);
        }

        // D is the only sink and must finish at the project end.
        let d = schedule.timing("D").unwrap();
        assert!((d.latest_finish - schedule.project_duration).abs() < 1e-9);
    }

    #[test]
    fn test_critical_path_exists() {
        let mut graph = ActivityGraph::new();
        graph.add_activity("A", 2.0, vec![]).unwrap();
        graph.add_activity("B", 3.0, preds(&["A"])).unwrap();
        graph.add_activity("C", 1.0, preds(&["B"])).unwrap();

        let schedule = compute_schedule(&graph, 0);
        // A pure chain is critical end to end.
        assert_eq!(schedule.critical_activities(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_recompute_idempotent() {
        let graph = fork_graph();
        let first = compute_schedule(&graph, 0);
        let second = compute_schedule(&graph, 0);
        assert_eq!(first.timings, second.timings);
        assert!((first.project_duration - second.project_duration).abs() < 1e-9);
    }

    #[test]
    fn test_arbitrary_insertion_order() {
        // Successor inserted before its predecessor link exists; the memoized
        // walk must not depend on a pre-sorted topological list.
        let mut graph = ActivityGraph::new();
        graph.add_activity("LATE", 4.0, vec![]).unwrap();
        graph.add_activity("EARLY", 3.0, vec![]).unwrap();
        graph.add_dependency("EARLY", "LATE").unwrap();

        let schedule = compute_schedule(&graph, 0);
        assert!((schedule.timing("LATE").unwrap().earliest_start - 3.0).abs() < 1e-9);
        assert!((schedule.project_duration - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_cycle_terminates() {
        let mut graph = ActivityGraph::new();
        graph.add_activity("A", 3.0, vec![]).unwrap();
        graph.add_activity("B", 2.0, preds(&["A"])).unwrap();
        graph.add_dependency("B", "A").unwrap(); // A <-> B

        let schedule = compute_schedule(&graph, 0);
        assert!(schedule.has_cycle());
        assert!(schedule.project_duration >= 0.0);
        assert!(schedule.project_duration.is_finite());
    }

    #[test]
    fn test_empty_graph() {
        let schedule = compute_schedule(&ActivityGraph::new(), 0);
        assert!((schedule.project_duration - 0.0).abs() < 1e-9);
        assert!(schedule.timings.is_empty());
    }

    #[test]
    fn test_milestone_anchors() {
        let mut graph = ActivityGraph::new();
        graph.add_activity("START", 0.0, vec![]).unwrap();
        graph.add_activity("A", 5.0, preds(&["START"])).unwrap();
        graph.add_activity("END", 0.0, preds(&["A"])).unwrap();

        let schedule = compute_schedule(&graph, 0);
        assert!((schedule.project_duration - 5.0).abs() < 1e-9);
        assert!(schedule.is_critical("START"));
        assert!(schedule.is_critical("END"));
    }
}
