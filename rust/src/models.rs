//! Core data types for the task graph.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned task identifier, stable for the lifetime of the task.
pub type TaskId = i64;

/// A task as persisted by the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub duration_days: u32,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub done: bool,
    /// Derived by the recompute pass; `None` until the first pass.
    pub earliest_start_date: Option<NaiveDate>,
    /// Derived by the recompute pass.
    pub is_critical: bool,
}

/// A "depends-on" edge: `task_id` cannot start before `depends_on_id` finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub task_id: TaskId,
    pub depends_on_id: TaskId,
}

impl Dependency {
    pub fn new(task_id: TaskId, depends_on_id: TaskId) -> Self {
        Self {
            task_id,
            depends_on_id,
        }
    }

    /// Whether either endpoint is `id`.
    pub fn touches(&self, id: TaskId) -> bool {
        self.task_id == id || self.depends_on_id == id
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} depends on {}", self.task_id, self.depends_on_id)
    }
}

/// Caller input for creating a task. Missing fields take configured defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, days: u32) -> Self {
        self.duration_days = Some(days);
        self
    }

    pub fn with_due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }
}

/// Validated task fields handed to the store, which assigns the id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub duration_days: u32,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Partial update of a task's caller-owned fields.
///
/// `due_date: Some(None)` clears the due date.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub duration_days: Option<u32>,
    pub due_date: Option<Option<NaiveDate>>,
    pub done: Option<bool>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.duration_days.is_none()
            && self.due_date.is_none()
            && self.done.is_none()
    }
}

/// The two fields the recompute pass owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DerivedFields {
    pub task_id: TaskId,
    pub earliest_start_date: Option<NaiveDate>,
    pub is_critical: bool,
}

/// Lightweight reference used in task listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub id: TaskId,
    pub title: String,
}

/// A task together with its direct neighbours.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetails {
    #[serde(flatten)]
    pub task: Task,
    /// Tasks this one waits for.
    pub dependencies: Vec<TaskRef>,
    /// Tasks waiting for this one.
    pub dependents: Vec<TaskRef>,
}

/// Edge between two entries of a [`BulkCreateRequest`], by list position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedDependency {
    pub task_index: usize,
    pub depends_on_index: usize,
}

impl IndexedDependency {
    pub fn new(task_index: usize, depends_on_index: usize) -> Self {
        Self {
            task_index,
            depends_on_index,
        }
    }
}

/// Several tasks plus the edges between them, created atomically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateRequest {
    pub tasks: Vec<NewTask>,
    #[serde(default)]
    pub dependencies: Vec<IndexedDependency>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateOutcome {
    pub tasks: Vec<Task>,
    pub dependencies: Vec<Dependency>,
}

/// Critical tasks in topological order plus the project duration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPathSummary {
    pub critical_path: Vec<TaskId>,
    pub total_duration: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyInfo {
    pub dependencies: Vec<Dependency>,
    pub critical_path: CriticalPathSummary,
}
