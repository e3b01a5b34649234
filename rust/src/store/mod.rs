//! Task/edge store interface.
//!
//! The relational store behind the service is an external collaborator; these
//! traits are the whole contract the scheduler relies on. Every call may fail
//! with [`StoreError::Unavailable`] and nothing else.
//!
//! Reads go through [`TaskRepository::read`], which hands out one consistent
//! view. Writes go through [`TaskRepository::transaction`]: the closure's
//! changes become visible together when it returns `Ok`, and are discarded
//! when it returns `Err`.

mod memory;

pub use memory::InMemoryTaskStore;

use std::sync::Arc;

use crate::error::StoreError;
use crate::models::{Dependency, DerivedFields, Task, TaskDraft, TaskId};

/// Read access to one consistent point-in-time view of the store.
pub trait TaskReader {
    /// All tasks, ordered by id.
    fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;

    /// All edges, ordered by `(task_id, depends_on_id)`.
    fn list_dependencies(&self) -> Result<Vec<Dependency>, StoreError>;

    fn get_task(&self, id: TaskId) -> Result<Option<Task>, StoreError>;
}

/// Mutations available inside a transaction.
pub trait TaskWriter: TaskReader {
    /// Persist a new task and return it with its assigned id.
    fn insert_task(&mut self, draft: TaskDraft) -> Result<Task, StoreError>;

    /// Overwrite the caller-owned fields of an existing task.
    /// Returns `false` if the task does not exist.
    fn update_task(&mut self, task: &Task) -> Result<bool, StoreError>;

    /// Delete a task and every edge touching it.
    /// Returns `false` if the task does not exist.
    fn delete_task(&mut self, id: TaskId) -> Result<bool, StoreError>;

    fn insert_dependency(&mut self, dependency: Dependency) -> Result<(), StoreError>;

    /// Returns `false` if the edge does not exist.
    fn delete_dependency(&mut self, dependency: Dependency) -> Result<bool, StoreError>;

    /// Write the derived schedule fields for a batch of tasks.
    fn write_derived(&mut self, fields: &[DerivedFields]) -> Result<(), StoreError>;
}

/// A store that can hand out consistent read views and atomic transactions.
pub trait TaskRepository: Send + Sync {
    fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn TaskReader) -> Result<T, E>,
        E: From<StoreError>;

    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn TaskWriter) -> Result<T, E>,
        E: From<StoreError>;
}

impl<T: TaskRepository> TaskRepository for &T {
    fn read<U, E, F>(&self, f: F) -> Result<U, E>
    where
        F: FnOnce(&dyn TaskReader) -> Result<U, E>,
        E: From<StoreError>,
    {
        (**self).read(f)
    }

    fn transaction<U, E, F>(&self, f: F) -> Result<U, E>
    where
        F: FnOnce(&mut dyn TaskWriter) -> Result<U, E>,
        E: From<StoreError>,
    {
        (**self).transaction(f)
    }
}

impl<T: TaskRepository> TaskRepository for Arc<T> {
    fn read<U, E, F>(&self, f: F) -> Result<U, E>
    where
        F: FnOnce(&dyn TaskReader) -> Result<U, E>,
        E: From<StoreError>,
    {
        (**self).read(f)
    }

    fn transaction<U, E, F>(&self, f: F) -> Result<U, E>
    where
        F: FnOnce(&mut dyn TaskWriter) -> Result<U, E>,
        E: From<StoreError>,
    {
        (**self).transaction(f)
    }
}
