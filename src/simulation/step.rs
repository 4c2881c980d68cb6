//! Pure per-tick transition functions for the fill and unfill runs.

use rustc_hash::FxHashSet;

use crate::config::SimulationConfig;
use crate::cpm::Schedule;
use crate::graph::ActivityGraph;
use crate::models::{ActivityState, Direction};
use crate::{log_changes, log_checks};

use super::state::SimulationState;

/// Advance the simulation by one tick.
///
/// Pure: the input snapshot is untouched and the successor snapshot is
/// returned. A paused or idle snapshot steps to itself. All transitions
/// within a tick are gated on a consistent completion snapshot, so the
/// result does not depend on activity iteration order.
pub fn step(
    state: &SimulationState,
    graph: &ActivityGraph,
    schedule: &Schedule,
    config: &SimulationConfig,
) -> SimulationState {
    if state.paused {
        return state.clone();
    }
    match state.direction {
        Direction::Idle => state.clone(),
        Direction::Forward => step_forward(state, graph, schedule, config),
        Direction::Backward => step_backward(state, graph, config),
    }
}

/// One forward ("fill") tick: evaluate transitions at the current clock,
/// then advance the clock — so source activities start at time 0.
fn step_forward(
    state: &SimulationState,
    graph: &ActivityGraph,
    schedule: &Schedule,
    config: &SimulationConfig,
) -> SimulationState {
    let verbosity = config.verbosity;
    let mut next = state.clone();
    let now = next.current_time;

    // Completion sweep: progress every in-flight activity.
    for activity in graph.iter() {
        let id = activity.id.as_str();
        let mut finished = false;
        if let Some(run) = next.runs.get_mut(id) {
            if run.state == ActivityState::InProgress {
                if activity.duration == 0.0 {
                    run.progress = 1.0;
                } else {
                    let started = run.start_time.unwrap_or(now);
                    run.progress = ((now - started) / activity.duration).min(1.0);
                }
                if run.progress >= 1.0 {
                    run.state = ActivityState::Completed;
                    run.finish_time = Some(now);
                    finished = true;
                }
            }
        }
        if finished {
            next.record_end(id, now);
            log_changes!(verbosity, "{} completed at {:.1}", id, now);
        }
    }

    // Start sweep, gated on the post-completion snapshot: an activity that
    // completes during this sweep (a milestone) cannot unlock a successor
    // until the next tick.
    let completed: FxHashSet<String> = next
        .runs
        .iter()
        .filter(|(_, run)| run.state == ActivityState::Completed)
        .map(|(id, _)| id.clone())
        .collect();

    for activity in graph.iter() {
        let id = activity.id.as_str();
        let eligible = activity
            .predecessors
            .iter()
            .all(|pred| completed.contains(pred.as_str()));
        let mut started = false;
        let mut finished = false;
        if let Some(run) = next.runs.get_mut(id) {
            if run.state == ActivityState::NotStarted {
                log_checks!(verbosity, "{} eligible to start: {}", id, eligible);
                if eligible {
                    run.state = ActivityState::InProgress;
                    run.start_time = Some(now);
                    run.progress = 0.0;
                    started = true;
                    if activity.duration == 0.0 {
                        // Milestones fill instantly.
                        run.progress = 1.0;
                        run.state = ActivityState::Completed;
                        run.finish_time = Some(now);
                        finished = true;
                    }
                }
            }
        }
        if started {
            next.record_start(id, now);
            log_changes!(verbosity, "{} started at {:.1}", id, now);
        }
        if finished {
            next.record_end(id, now);
            log_changes!(verbosity, "{} completed at {:.1}", id, now);
        }
    }

    if next.all_in(ActivityState::Completed) {
        // Snap to the exact project end to avoid overshoot from the last
        // discrete tick.
        next.current_time = schedule.project_duration;
        next.direction = Direction::Idle;
        next.project_complete = true;
        log_changes!(
            verbosity,
            "forward run finished at {:.1}",
            next.current_time
        );
    } else {
        next.current_time = now + config.tick_delta();
    }

    next
}

/// One backward ("unfill") tick: advance the clock, then drain.
fn step_backward(
    state: &SimulationState,
    graph: &ActivityGraph,
    config: &SimulationConfig,
) -> SimulationState {
    let verbosity = config.verbosity;
    let mut next = state.clone();
    next.current_time += config.tick_delta();
    let now = next.current_time;

    // Drain sweep: anchored activities lose progress.
    for activity in graph.iter() {
        let id = activity.id.as_str();
        let mut drained = false;
        if let Some(run) = next.runs.get_mut(id) {
            if run.state == ActivityState::Unfilling {
                if let Some(anchor) = run.unfill_start_time {
                    if activity.duration == 0.0 {
                        run.progress = 0.0;
                    } else {
                        run.progress = (1.0 - (now - anchor) / activity.duration).max(0.0);
                    }
                    if run.progress <= 0.0 {
                        run.progress = 0.0;
                        run.state = ActivityState::Unfilled;
                        drained = true;
                    }
                }
            }
        }
        if drained {
            log_changes!(verbosity, "{} unfilled at {:.1}", id, now);
        }
    }

    // Release sweep, gated on the post-drain snapshot: an activity may begin
    // unfilling only when all of its successors are already unfilled.
    let unfilled: FxHashSet<String> = next
        .runs
        .iter()
        .filter(|(_, run)| run.state == ActivityState::Unfilled)
        .map(|(id, _)| id.clone())
        .collect();

    for activity in graph.iter() {
        let id = activity.id.as_str();
        let released = activity
            .successors
            .iter()
            .all(|succ| unfilled.contains(succ.as_str()));
        if let Some(run) = next.runs.get_mut(id) {
            if run.state == ActivityState::Unfilling && run.unfill_start_time.is_none() {
                log_checks!(verbosity, "{} eligible to unfill: {}", id, released);
                if released {
                    run.unfill_start_time = Some(now);
                    if activity.duration == 0.0 {
                        // Milestones drain instantly.
                        run.progress = 0.0;
                        run.state = ActivityState::Unfilled;
                    }
                }
            }
        }
    }

    if next.all_in(ActivityState::Unfilled) {
        next.direction = Direction::Idle;
        log_changes!(verbosity, "backward run finished at {:.1}", now);
    }

    next
}
