//! Critical path method (CPM) scheduling.
//!
//! Computes a topological order, forward-pass earliest start/finish offsets,
//! backward-pass latest start/finish offsets, slack, and the set of critical
//! tasks for a [`GraphSnapshot`](crate::snapshot::GraphSnapshot).

mod calculation;
mod types;

pub use calculation::{compute_schedule, topological_sort, CriticalPathError};
pub use types::{Schedule, TaskTiming};
