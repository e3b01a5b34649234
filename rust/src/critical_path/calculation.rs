//! Critical path calculation using forward and backward passes.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::trace;

use crate::interner::NodeId;
use crate::models::TaskId;
use crate::snapshot::GraphSnapshot;

use super::types::{Schedule, TaskTiming};

/// Error types for critical path calculation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CriticalPathError {
    /// Kahn's algorithm stalled; the listed tasks sit on or behind a cycle.
    #[error("circular dependency detected; unordered tasks: {unresolved:?}")]
    CircularDependency { unresolved: Vec<TaskId> },
}

/// Perform topological sort of the snapshot using Kahn's algorithm.
///
/// Returns nodes such that every task comes after all of its dependencies.
/// Ready nodes are taken in node order, so the result is deterministic.
pub fn topological_sort(snapshot: &GraphSnapshot) -> Result<Vec<NodeId>, CriticalPathError> {
    let n = snapshot.len();

    // In-degree = number of unprocessed dependencies
    let mut in_degree: Vec<usize> = (0..n as NodeId)
        .map(|node| snapshot.dependencies_of(node).len())
        .collect();

    let mut queue: VecDeque<NodeId> = (0..n as NodeId)
        .filter(|&node| in_degree[node as usize] == 0)
        .collect();

    let mut order: Vec<NodeId> = Vec::with_capacity(n);

    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &dependent in snapshot.dependents_of(node) {
            let degree = &mut in_degree[dependent as usize];
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if order.len() != n {
        let unresolved = (0..n as NodeId)
            .filter(|&node| in_degree[node as usize] > 0)
            .map(|node| snapshot.task_id(node))
            .collect();
        return Err(CriticalPathError::CircularDependency { unresolved });
    }

    Ok(order)
}

/// Run the full CPM calculation over a snapshot.
///
/// Forward pass: `earliest_start` is the latest `earliest_finish` among the
/// task's dependencies (0 for tasks without any). The project duration is the
/// largest `earliest_finish`.
///
/// Backward pass: `tail` is the longest duration-weighted path starting at a
/// task, including the task itself. `latest_start = project - tail` and slack
/// is `latest_start - earliest_start`. Every task on any longest path has zero
/// slack, so ties mark all tied paths critical.
pub fn compute_schedule(snapshot: &GraphSnapshot) -> Result<Schedule, CriticalPathError> {
    let order = topological_sort(snapshot)?;
    let n = snapshot.len();

    // Forward pass
    let mut timings: Vec<TaskTiming> = vec![TaskTiming::default(); n];
    let mut project_duration = 0u64;

    for &node in &order {
        let earliest_start = snapshot
            .dependencies_of(node)
            .iter()
            .map(|&dep| timings[dep as usize].earliest_finish)
            .max()
            .unwrap_or(0);
        let earliest_finish = earliest_start + u64::from(snapshot.duration(node));

        let timing = &mut timings[node as usize];
        timing.earliest_start = earliest_start;
        timing.earliest_finish = earliest_finish;
        project_duration = project_duration.max(earliest_finish);
    }

    // Backward pass (reverse topological order)
    let mut tails: Vec<u64> = vec![0; n];
    for &node in order.iter().rev() {
        let longest_after = snapshot
            .dependents_of(node)
            .iter()
            .map(|&dependent| tails[dependent as usize])
            .max()
            .unwrap_or(0);
        let duration = u64::from(snapshot.duration(node));
        let tail = duration + longest_after;
        tails[node as usize] = tail;

        let timing = &mut timings[node as usize];
        timing.latest_start = project_duration.saturating_sub(tail);
        timing.latest_finish = timing.latest_start + duration;
        timing.slack = timing.latest_start.saturating_sub(timing.earliest_start);

        trace!(
            task_id = snapshot.task_id(node),
            earliest_start = timing.earliest_start,
            latest_start = timing.latest_start,
            slack = timing.slack,
            "cpm timing"
        );
    }

    Ok(Schedule {
        task_ids: snapshot.task_ids().to_vec(),
        order,
        timings,
        project_duration,
    })
}
