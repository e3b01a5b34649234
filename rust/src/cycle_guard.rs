//! Validation of proposed dependency edges.

use rustc_hash::FxHashSet;

use crate::error::DependencyError;
use crate::interner::NodeId;
use crate::models::{Dependency, TaskId};
use crate::snapshot::GraphSnapshot;

/// Check whether `task_id` may start depending on `depends_on_id`.
///
/// Rejections are reported in a fixed order: self dependency, unknown task,
/// duplicate edge, cycle.
pub fn check_new_dependency(
    snapshot: &GraphSnapshot,
    task_id: TaskId,
    depends_on_id: TaskId,
) -> Result<(), DependencyError> {
    if task_id == depends_on_id {
        return Err(DependencyError::SelfDependency(task_id));
    }

    let task = snapshot
        .node(task_id)
        .ok_or(DependencyError::UnknownTask(task_id))?;
    let depends_on = snapshot
        .node(depends_on_id)
        .ok_or(DependencyError::UnknownTask(depends_on_id))?;

    if snapshot.has_edge(&Dependency::new(task_id, depends_on_id)) {
        return Err(DependencyError::DuplicateEdge {
            task_id,
            depends_on_id,
        });
    }

    if would_create_cycle(snapshot, task, depends_on) {
        return Err(DependencyError::WouldCreateCycle {
            task_id,
            depends_on_id,
        });
    }

    Ok(())
}

/// Whether adding "`task` depends on `depends_on`" would close a cycle.
///
/// True iff `task` is already reachable from `depends_on` by following
/// dependency edges. Iterative DFS with an explicit stack.
pub fn would_create_cycle(snapshot: &GraphSnapshot, task: NodeId, depends_on: NodeId) -> bool {
    if task == depends_on {
        return true;
    }

    let mut visited: FxHashSet<NodeId> = FxHashSet::default();
    let mut stack = vec![depends_on];
    visited.insert(depends_on);

    while let Some(node) = stack.pop() {
        for &next in snapshot.dependencies_of(node) {
            if next == task {
                return true;
            }
            if visited.insert(next) {
                stack.push(next);
            }
        }
    }
    false
}
