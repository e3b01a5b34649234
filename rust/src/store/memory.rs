//! In-memory task store.
//!
//! Transactions work on a private copy of the state that replaces the shared
//! state only on success, so a failed closure leaves nothing behind. The
//! write lock is held for the whole transaction, which serializes writers.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::error::StoreError;
use crate::models::{Dependency, DerivedFields, Task, TaskDraft, TaskId};

use super::{TaskReader, TaskRepository, TaskWriter};

#[derive(Debug, Clone, Default)]
struct StoreState {
    next_id: TaskId,
    tasks: BTreeMap<TaskId, Task>,
    dependencies: BTreeSet<Dependency>,
}

/// Switches used by tests to simulate an unreachable backend.
#[derive(Debug, Default)]
struct Faults {
    unavailable: AtomicBool,
    fail_derived_writes: AtomicBool,
    derived_batches: AtomicUsize,
}

impl Faults {
    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }
}

/// Thread-safe in-memory [`TaskRepository`].
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    state: RwLock<StoreState>,
    faults: Faults,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make only derived-field write-back fail.
    pub fn set_fail_derived_writes(&self, fail: bool) {
        self.faults.fail_derived_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of derived-field batches written by committed or aborted
    /// transactions.
    pub fn derived_batches_written(&self) -> usize {
        self.faults.derived_batches.load(Ordering::SeqCst)
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("store lock poisoned".to_string())
    }
}

impl TaskRepository for InMemoryTaskStore {
    fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn TaskReader) -> Result<T, E>,
        E: From<StoreError>,
    {
        let guard = self.state.read().map_err(|_| Self::poisoned())?;
        self.faults.check()?;
        let view = MemoryView {
            state: &*guard,
            faults: &self.faults,
        };
        f(&view)
    }

    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn TaskWriter) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self.state.write().map_err(|_| Self::poisoned())?;
        self.faults.check()?;
        let mut tx = MemoryTransaction {
            state: (*guard).clone(),
            faults: &self.faults,
        };
        let out = f(&mut tx)?;
        *guard = tx.state;
        Ok(out)
    }
}

struct MemoryView<'a> {
    state: &'a StoreState,
    faults: &'a Faults,
}

struct MemoryTransaction<'a> {
    state: StoreState,
    faults: &'a Faults,
}

fn list_tasks(state: &StoreState) -> Vec<Task> {
    state.tasks.values().cloned().collect()
}

fn list_dependencies(state: &StoreState) -> Vec<Dependency> {
    state.dependencies.iter().copied().collect()
}

impl TaskReader for MemoryView<'_> {
    fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.faults.check()?;
        Ok(list_tasks(self.state))
    }

    fn list_dependencies(&self) -> Result<Vec<Dependency>, StoreError> {
        self.faults.check()?;
        Ok(list_dependencies(self.state))
    }

    fn get_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        self.faults.check()?;
        Ok(self.state.tasks.get(&id).cloned())
    }
}

impl TaskReader for MemoryTransaction<'_> {
    fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.faults.check()?;
        Ok(list_tasks(&self.state))
    }

    fn list_dependencies(&self) -> Result<Vec<Dependency>, StoreError> {
        self.faults.check()?;
        Ok(list_dependencies(&self.state))
    }

    fn get_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        self.faults.check()?;
        Ok(self.state.tasks.get(&id).cloned())
    }
}

impl TaskWriter for MemoryTransaction<'_> {
    fn insert_task(&mut self, draft: TaskDraft) -> Result<Task, StoreError> {
        self.faults.check()?;
        self.state.next_id += 1;
        let task = Task {
            id: self.state.next_id,
            title: draft.title,
            duration_days: draft.duration_days,
            due_date: draft.due_date,
            created_at: draft.created_at,
            done: false,
            earliest_start_date: None,
            is_critical: false,
        };
        self.state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    fn update_task(&mut self, task: &Task) -> Result<bool, StoreError> {
        self.faults.check()?;
        let Some(stored) = self.state.tasks.get_mut(&task.id) else {
            return Ok(false);
        };
        stored.title = task.title.clone();
        stored.duration_days = task.duration_days;
        stored.due_date = task.due_date;
        stored.done = task.done;
        Ok(true)
    }

    fn delete_task(&mut self, id: TaskId) -> Result<bool, StoreError> {
        self.faults.check()?;
        if self.state.tasks.remove(&id).is_none() {
            return Ok(false);
        }
        self.state.dependencies.retain(|dep| !dep.touches(id));
        Ok(true)
    }

    fn insert_dependency(&mut self, dependency: Dependency) -> Result<(), StoreError> {
        self.faults.check()?;
        self.state.dependencies.insert(dependency);
        Ok(())
    }

    fn delete_dependency(&mut self, dependency: Dependency) -> Result<bool, StoreError> {
        self.faults.check()?;
        Ok(self.state.dependencies.remove(&dependency))
    }

    fn write_derived(&mut self, fields: &[DerivedFields]) -> Result<(), StoreError> {
        self.faults.check()?;
        self.faults.derived_batches.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_derived_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "derived field write rejected".to_string(),
            ));
        }
        for field in fields {
            if let Some(task) = self.state.tasks.get_mut(&field.task_id) {
                task.earliest_start_date = field.earliest_start_date;
                task.is_critical = field.is_critical;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_draft(title: &str, duration: u32) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            duration_days: duration,
            due_date: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap(),
        }
    }

    fn insert(store: &InMemoryTaskStore, title: &str) -> Task {
        store
            .transaction(|tx| tx.insert_task(make_draft(title, 1)))
            .unwrap()
    }

    #[test]
    fn test_ids_are_assigned_sequentially() {
        let store = InMemoryTaskStore::new();
        let a = insert(&store, "a");
        let b = insert(&store, "b");
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(!a.is_critical);
        assert_eq!(a.earliest_start_date, None);
    }

    #[test]
    fn test_failed_transaction_is_discarded() {
        let store = InMemoryTaskStore::new();
        let a = insert(&store, "a");

        let result: Result<(), StoreError> = store.transaction(|tx| {
            tx.insert_task(make_draft("b", 2))?;
            tx.delete_task(a.id)?;
            Err(StoreError::Unavailable("abort".to_string()))
        });
        assert!(result.is_err());

        let tasks = store.read(|r| r.list_tasks()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, a.id);
    }

    #[test]
    fn test_delete_task_cascades_edges() {
        let store = InMemoryTaskStore::new();
        let a = insert(&store, "a");
        let b = insert(&store, "b");
        let c = insert(&store, "c");
        store
            .transaction(|tx| {
                tx.insert_dependency(Dependency::new(b.id, a.id))?;
                tx.insert_dependency(Dependency::new(c.id, b.id))
            })
            .unwrap();

        let deleted = store.transaction(|tx| tx.delete_task(b.id)).unwrap();
        assert!(deleted);
        assert!(store.read(|r| r.list_dependencies()).unwrap().is_empty());

        let missing = store.transaction(|tx| tx.delete_task(b.id)).unwrap();
        assert!(!missing);
    }

    #[test]
    fn test_update_keeps_derived_fields() {
        let store = InMemoryTaskStore::new();
        let mut a = insert(&store, "a");
        store
            .transaction(|tx| {
                tx.write_derived(&[DerivedFields {
                    task_id: a.id,
                    earliest_start_date: chrono::NaiveDate::from_ymd_opt(2025, 1, 6),
                    is_critical: true,
                }])
            })
            .unwrap();

        a.title = "renamed".to_string();
        a.is_critical = false;
        assert!(store.transaction(|tx| tx.update_task(&a)).unwrap());

        let stored = store.read(|r| r.get_task(a.id)).unwrap().unwrap();
        assert_eq!(stored.title, "renamed");
        assert!(stored.is_critical);
    }

    #[test]
    fn test_unavailable_store_fails_reads_and_writes() {
        let store = InMemoryTaskStore::new();
        insert(&store, "a");
        store.set_unavailable(true);

        let read: Result<Vec<Task>, StoreError> = store.read(|r| r.list_tasks());
        assert!(matches!(read, Err(StoreError::Unavailable(_))));

        let write: Result<Task, StoreError> =
            store.transaction(|tx| tx.insert_task(make_draft("b", 1)));
        assert!(matches!(write, Err(StoreError::Unavailable(_))));

        store.set_unavailable(false);
        assert_eq!(store.read(|r| r.list_tasks()).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_derived_write_rolls_back() {
        let store = InMemoryTaskStore::new();
        let a = insert(&store, "a");
        store.set_fail_derived_writes(true);

        let result = store.transaction(|tx| {
            tx.insert_dependency(Dependency::new(a.id, 99))?;
            tx.write_derived(&[])
        });
        assert!(result.is_err());
        assert_eq!(store.derived_batches_written(), 1);
        assert!(store.read(|r| r.list_dependencies()).unwrap().is_empty());
    }
}
