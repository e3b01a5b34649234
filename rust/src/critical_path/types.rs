//! Types for critical path calculation.

use crate::interner::NodeId;
use crate::models::TaskId;

/// Per-task timing in whole days from the project epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskTiming {
    /// Earliest possible start (from forward pass).
    pub earliest_start: u64,
    /// Earliest possible finish (from forward pass).
    pub earliest_finish: u64,
    /// Latest start that does not delay the project (from backward pass).
    pub latest_start: u64,
    /// Latest finish that does not delay the project (from backward pass).
    pub latest_finish: u64,
    /// Slack = latest_start - earliest_start.
    pub slack: u64,
}

impl TaskTiming {
    pub fn is_critical(&self) -> bool {
        self.slack == 0
    }
}

/// Result of one CPM pass over a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Store ids indexed by node, copied from the snapshot (ascending).
    pub(crate) task_ids: Vec<TaskId>,
    /// Nodes in topological order (dependencies first).
    pub(crate) order: Vec<NodeId>,
    /// Timings indexed by node.
    pub(crate) timings: Vec<TaskTiming>,
    pub(crate) project_duration: u64,
}

impl Schedule {
    /// Maximum earliest finish over all tasks; zero for an empty graph.
    pub fn project_duration(&self) -> u64 {
        self.project_duration
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn timing(&self, task_id: TaskId) -> Option<&TaskTiming> {
        self.task_ids
            .binary_search(&task_id)
            .ok()
            .map(|idx| &self.timings[idx])
    }

    /// Task ids in topological order.
    pub fn topological_order(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.order.iter().map(|&node| self.task_ids[node as usize])
    }

    /// `(task id, timing)` pairs in topological order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &TaskTiming)> + '_ {
        self.order
            .iter()
            .map(|&node| (self.task_ids[node as usize], &self.timings[node as usize]))
    }

    /// Ids of every zero-slack task, in topological order.
    pub fn critical_tasks(&self) -> Vec<TaskId> {
        self.iter()
            .filter(|(_, timing)| timing.is_critical())
            .map(|(id, _)| id)
            .collect()
    }
}
