//! Error types shared across the task graph.
//!
//! Failures fall into three classes (see [`ErrorKind`]): caller mistakes that
//! are reported verbatim, broken graph invariants that are reported as an
//! internal fault, and store outages that are safe to retry.

use thiserror::Error;

use crate::models::TaskId;

/// Failure reported by the task/edge store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("task store unavailable: {0}")]
    Unavailable(String),
}

/// Rejected edge mutation. Nothing is written when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskId),
    #[error("task {0} does not exist")]
    UnknownTask(TaskId),
    #[error("task {task_id} already depends on task {depends_on_id}")]
    DuplicateEdge {
        task_id: TaskId,
        depends_on_id: TaskId,
    },
    #[error("making task {task_id} depend on task {depends_on_id} would create a cycle")]
    WouldCreateCycle {
        task_id: TaskId,
        depends_on_id: TaskId,
    },
    #[error("task {task_id} does not depend on task {depends_on_id}")]
    EdgeNotFound {
        task_id: TaskId,
        depends_on_id: TaskId,
    },
}

/// Rejected task mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("title is required")]
    EmptyTitle,
    #[error("duration must be at least one day (got {0})")]
    InvalidDuration(u32),
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    #[error("at least one task is required")]
    NoTasks,
    #[error("dependency references non-existent task index {index} (have {len} tasks)")]
    InvalidDependencyIndex { index: usize, len: usize },
}

/// Broad classification used to decide what callers get to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller error; the message is safe to return.
    Validation,
    /// Invariant breach inside the scheduler. Never retried.
    Consistency,
    /// Store outage. The whole operation may be retried.
    Transient,
}
