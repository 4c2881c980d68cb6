//! Critical path method schedule calculator.
//!
//! Pure functions over a graph snapshot: a forward pass computes earliest
//! start/finish times, a backward pass computes latest start/finish and
//! slack. The result is recomputed wholesale after any graph mutation; there
//! is no incremental update path.

mod calculation;
mod types;

pub use calculation::compute_schedule;
pub use types::{ActivityTiming, Schedule, CRITICAL_SLACK_EPSILON};
