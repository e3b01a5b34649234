//! The recompute pass: snapshot, CPM, write-back.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use crate::calendar;
use crate::config::SchedulerConfig;
use crate::critical_path::{compute_schedule, CriticalPathError, TaskTiming};
use crate::error::StoreError;
use crate::models::{CriticalPathSummary, DerivedFields, TaskId};
use crate::snapshot::GraphSnapshot;
use crate::store::TaskWriter;

/// Errors that abort a recompute pass. No derived field is written when one
/// of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("inconsistent task graph: {0}")]
    InconsistentGraph(#[from] CriticalPathError),
    #[error("earliest start of task {task_id} ({offset_days} days after {epoch}) is out of calendar range")]
    DateOutOfRange {
        task_id: TaskId,
        epoch: NaiveDate,
        offset_days: u64,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Derived schedule entry for one task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskSchedule {
    pub task_id: TaskId,
    pub timing: TaskTiming,
    pub earliest_start_date: Option<NaiveDate>,
}

impl TaskSchedule {
    pub fn is_critical(&self) -> bool {
        self.timing.is_critical()
    }
}

/// Outcome of one pass, tasks in topological order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Calendar date of offset zero; `None` for an empty project.
    pub epoch: Option<NaiveDate>,
    pub project_duration: u64,
    pub tasks: Vec<TaskSchedule>,
}

impl ScheduleReport {
    pub fn task(&self, task_id: TaskId) -> Option<&TaskSchedule> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    pub fn critical_path(&self) -> CriticalPathSummary {
        CriticalPathSummary {
            critical_path: self
                .tasks
                .iter()
                .filter(|t| t.is_critical())
                .map(|t| t.task_id)
                .collect(),
            total_duration: self.project_duration,
        }
    }

    /// Write-back rows for every task, changed or not.
    pub fn derived_fields(&self) -> Vec<DerivedFields> {
        self.tasks
            .iter()
            .map(|t| DerivedFields {
                task_id: t.task_id,
                earliest_start_date: t.earliest_start_date,
                is_critical: t.is_critical(),
            })
            .collect()
    }
}

/// Compute the schedule for a snapshot without touching the store.
pub fn plan(
    snapshot: &GraphSnapshot,
    config: &SchedulerConfig,
) -> Result<ScheduleReport, ScheduleError> {
    let schedule = compute_schedule(snapshot)?;
    let epoch = calendar::project_epoch(&config.epoch, snapshot.creation_dates());

    let mut tasks = Vec::with_capacity(schedule.len());
    for (task_id, timing) in schedule.iter() {
        let earliest_start_date = match epoch {
            Some(epoch) => Some(
                calendar::offset_to_date(epoch, timing.earliest_start).ok_or(
                    ScheduleError::DateOutOfRange {
                        task_id,
                        epoch,
                        offset_days: timing.earliest_start,
                    },
                )?,
            ),
            None => None,
        };
        tasks.push(TaskSchedule {
            task_id,
            timing: *timing,
            earliest_start_date,
        });
    }

    Ok(ScheduleReport {
        epoch,
        project_duration: schedule.project_duration(),
        tasks,
    })
}

/// Load a snapshot through `tx`, schedule it, and write the derived fields
/// of every task back in one batch.
pub fn recompute<W>(
    tx: &mut W,
    config: &SchedulerConfig,
) -> Result<ScheduleReport, ScheduleError>
where
    W: TaskWriter + ?Sized,
{
    let snapshot = GraphSnapshot::load(&*tx)?;
    let report = plan(&snapshot, config)?;
    tx.write_derived(&report.derived_fields())?;

    debug!(
        tasks = snapshot.len(),
        edges = snapshot.edge_count(),
        project_duration = report.project_duration,
        critical = report.tasks.iter().filter(|t| t.is_critical()).count(),
        "schedule recomputed"
    );
    Ok(report)
}
