//! Task graph service: every public mutation plus its recompute pass.
//!
//! Mutations are serialized by a single writer lock and each one runs inside a
//! single store transaction together with the recompute pass that follows it.
//! Either the mutation and all derived fields become visible, or nothing does.

use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::calendar;
use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::cycle_guard;
use crate::error::{DependencyError, ErrorKind, StoreError, TaskError};
use crate::models::{
    BulkCreateOutcome, BulkCreateRequest, Dependency, DependencyInfo, NewTask, Task, TaskDetails,
    TaskDraft, TaskId, TaskRef, TaskUpdate,
};
use crate::snapshot::GraphSnapshot;
use crate::store::{TaskRepository, TaskWriter};

use super::recompute::{plan, recompute, ScheduleError, ScheduleReport};

/// Error returned by every service operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Schedule(ScheduleError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ScheduleError> for ServiceError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Store(store) => Self::Store(store),
            other => Self::Schedule(other),
        }
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Dependency(_) | Self::Task(_) => ErrorKind::Validation,
            Self::Schedule(_) => ErrorKind::Consistency,
            Self::Store(_) => ErrorKind::Transient,
        }
    }

    /// Message safe to hand back to an API caller. Consistency faults are
    /// reported generically; the details only go to the log.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation => self.to_string(),
            ErrorKind::Consistency => "internal scheduling error".to_string(),
            ErrorKind::Transient => "task store temporarily unavailable, please retry".to_string(),
        }
    }
}

pub struct TaskGraphService<R, C = SystemClock> {
    repo: R,
    clock: C,
    config: SchedulerConfig,
    write_lock: Mutex<()>,
}

impl<R: TaskRepository> TaskGraphService<R, SystemClock> {
    pub fn new(repo: R, config: SchedulerConfig) -> Self {
        Self::with_clock(repo, config, SystemClock)
    }
}

impl<R: TaskRepository, C: Clock> TaskGraphService<R, C> {
    pub fn with_clock(repo: R, config: SchedulerConfig, clock: C) -> Self {
        Self {
            repo,
            clock,
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Make `task_id` depend on `depends_on_id` and reschedule.
    pub fn add_dependency(
        &self,
        task_id: TaskId,
        depends_on_id: TaskId,
    ) -> Result<ScheduleReport, ServiceError> {
        self.mutate("add_dependency", |tx, config| {
            let snapshot = GraphSnapshot::load(&*tx)?;
            cycle_guard::check_new_dependency(&snapshot, task_id, depends_on_id)?;
            let dependency = Dependency::new(task_id, depends_on_id);
            tx.insert_dependency(dependency)?;
            info!(%dependency, "dependency added");
            Ok(recompute(tx, config)?)
        })
    }

    /// Drop an existing edge and reschedule.
    pub fn remove_dependency(
        &self,
        task_id: TaskId,
        depends_on_id: TaskId,
    ) -> Result<ScheduleReport, ServiceError> {
        self.mutate("remove_dependency", |tx, config| {
            let dependency = Dependency::new(task_id, depends_on_id);
            if !tx.delete_dependency(dependency)? {
                return Err(DependencyError::EdgeNotFound {
                    task_id,
                    depends_on_id,
                }
                .into());
            }
            info!(%dependency, "dependency removed");
            Ok(recompute(tx, config)?)
        })
    }

    /// Recompute and persist derived fields for the whole graph.
    pub fn recompute_schedule(&self) -> Result<ScheduleReport, ServiceError> {
        self.mutate("recompute_schedule", |tx, config| Ok(recompute(tx, config)?))
    }

    pub fn create_task(&self, new_task: NewTask) -> Result<Task, ServiceError> {
        let draft = self.draft(new_task)?;
        self.mutate("create_task", |tx, config| {
            let task = tx.insert_task(draft)?;
            info!(task_id = task.id, title = %task.title, "task created");
            recompute(tx, config)?;
            reload(tx, task.id)
        })
    }

    /// Create several tasks and the edges between them atomically.
    ///
    /// Edges refer to tasks by their position in `request.tasks`. The whole
    /// batch is rejected if any task or edge is invalid.
    pub fn bulk_create(
        &self,
        request: BulkCreateRequest,
    ) -> Result<BulkCreateOutcome, ServiceError> {
        if request.tasks.is_empty() {
            return Err(TaskError::NoTasks.into());
        }
        let len = request.tasks.len();
        for edge in &request.dependencies {
            for index in [edge.task_index, edge.depends_on_index] {
                if index >= len {
                    return Err(TaskError::InvalidDependencyIndex { index, len }.into());
                }
            }
        }
        let drafts = request
            .tasks
            .into_iter()
            .map(|new_task| self.draft(new_task))
            .collect::<Result<Vec<_>, _>>()?;

        self.mutate("bulk_create", |tx, config| {
            let mut ids = Vec::with_capacity(drafts.len());
            for draft in drafts {
                ids.push(tx.insert_task(draft)?.id);
            }

            let tasks = tx.list_tasks()?;
            let mut edges = tx.list_dependencies()?;
            let mut added = Vec::with_capacity(request.dependencies.len());
            for edge in &request.dependencies {
                let dependency = Dependency::new(ids[edge.task_index], ids[edge.depends_on_index]);
                let snapshot = GraphSnapshot::from_parts(&tasks, &edges);
                cycle_guard::check_new_dependency(
                    &snapshot,
                    dependency.task_id,
                    dependency.depends_on_id,
                )?;
                tx.insert_dependency(dependency)?;
                edges.push(dependency);
                added.push(dependency);
            }
            info!(tasks = ids.len(), dependencies = added.len(), "bulk create");

            recompute(tx, config)?;
            let tasks = ids
                .iter()
                .map(|&id| reload(tx, id))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(BulkCreateOutcome {
                tasks,
                dependencies: added,
            })
        })
    }

    pub fn update_task(&self, id: TaskId, update: TaskUpdate) -> Result<Task, ServiceError> {
        let title = update.title.as_deref().map(normalize_title).transpose()?;
        if let Some(duration) = update.duration_days {
            check_duration(duration)?;
        }

        self.mutate("update_task", |tx, config| {
            let mut task = tx.get_task(id)?.ok_or(TaskError::TaskNotFound(id))?;
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(duration) = update.duration_days {
                task.duration_days = duration;
            }
            if let Some(due_date) = update.due_date {
                task.due_date = due_date;
            }
            if let Some(done) = update.done {
                task.done = done;
            }
            if !tx.update_task(&task)? {
                return Err(TaskError::TaskNotFound(id).into());
            }
            info!(task_id = id, "task updated");
            recompute(tx, config)?;
            reload(tx, id)
        })
    }

    /// Delete a task together with every edge touching it.
    pub fn delete_task(&self, id: TaskId) -> Result<ScheduleReport, ServiceError> {
        self.mutate("delete_task", |tx, config| {
            if !tx.delete_task(id)? {
                return Err(TaskError::TaskNotFound(id).into());
            }
            info!(task_id = id, "task deleted");
            Ok(recompute(tx, config)?)
        })
    }

    /// All tasks, newest first, with their direct dependencies and dependents.
    pub fn list_tasks(&self) -> Result<Vec<TaskDetails>, ServiceError> {
        let result = self.repo.read(|reader| {
            let tasks = reader.list_tasks()?;
            let edges = reader.list_dependencies()?;
            Ok(task_details(tasks, &edges))
        });
        self.observe("list_tasks", result)
    }

    /// Every edge plus the critical path of the current graph.
    pub fn dependency_info(&self) -> Result<DependencyInfo, ServiceError> {
        let result = self.repo.read(|reader| {
            let snapshot = GraphSnapshot::load(reader)?;
            let report = plan(&snapshot, &self.config)?;
            Ok(DependencyInfo {
                dependencies: reader.list_dependencies()?,
                critical_path: report.critical_path(),
            })
        });
        self.observe("dependency_info", result)
    }

    fn draft(&self, new_task: NewTask) -> Result<TaskDraft, TaskError> {
        let title = normalize_title(&new_task.title)?;
        let duration_days = new_task
            .duration_days
            .unwrap_or(self.config.default_duration_days);
        check_duration(duration_days)?;
        let due_date = new_task.due_date.unwrap_or_else(|| {
            calendar::default_due_date(
                self.clock.today(),
                self.config.default_due_date_business_days,
            )
        });
        Ok(TaskDraft {
            title,
            duration_days,
            due_date: Some(due_date),
            created_at: self.clock.now(),
        })
    }

    fn mutate<T, F>(&self, operation: &'static str, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut dyn TaskWriter, &SchedulerConfig) -> Result<T, ServiceError>,
    {
        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let result = self.repo.transaction(|tx| f(tx, &self.config));
        self.observe(operation, result)
    }

    fn observe<T>(
        &self,
        operation: &'static str,
        result: Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        if let Err(err) = &result {
            match err.kind() {
                ErrorKind::Validation => info!(operation, %err, "request rejected"),
                ErrorKind::Transient => warn!(operation, %err, "task store unavailable"),
                ErrorKind::Consistency => error!(operation, %err, "scheduling invariant violated"),
            }
        }
        result
    }
}

fn reload(tx: &mut dyn TaskWriter, id: TaskId) -> Result<Task, ServiceError> {
    Ok(tx.get_task(id)?.ok_or(TaskError::TaskNotFound(id))?)
}

fn normalize_title(title: &str) -> Result<String, TaskError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::EmptyTitle);
    }
    Ok(title.to_string())
}

fn check_duration(duration_days: u32) -> Result<(), TaskError> {
    if duration_days == 0 {
        return Err(TaskError::InvalidDuration(duration_days));
    }
    Ok(())
}

fn task_details(mut tasks: Vec<Task>, edges: &[Dependency]) -> Vec<TaskDetails> {
    let task_ref = |tasks: &[Task], id: TaskId| {
        tasks
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|idx| TaskRef {
                id,
                title: tasks[idx].title.clone(),
            })
    };

    tasks.sort_by_key(|t| t.id);
    let mut details: Vec<TaskDetails> = tasks
        .iter()
        .map(|task| TaskDetails {
            task: task.clone(),
            dependencies: edges
                .iter()
                .filter(|e| e.task_id == task.id)
                .filter_map(|e| task_ref(&tasks, e.depends_on_id))
                .collect(),
            dependents: edges
                .iter()
                .filter(|e| e.depends_on_id == task.id)
                .filter_map(|e| task_ref(&tasks, e.task_id))
                .collect(),
        })
        .collect();

    details.sort_by(|a, b| {
        b.task
            .created_at
            .cmp(&a.task.created_at)
            .then(b.task.id.cmp(&a.task.id))
    });
    details
}
