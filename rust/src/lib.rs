//! Task dependency graph with critical path scheduling.
//!
//! Tasks carry a duration in whole days and may depend on other tasks. Every
//! mutation of the graph is validated (no self edges, duplicates or cycles),
//! applied, and followed by a critical path pass that writes each task's
//! earliest start date and critical flag back to the store in the same
//! transaction.
//!
//! ```no_run
//! use taskgraph_cpm::{InMemoryTaskStore, NewTask, SchedulerConfig, TaskGraphService};
//!
//! let service = TaskGraphService::new(InMemoryTaskStore::new(), SchedulerConfig::default());
//! let design = service.create_task(NewTask::new("design").with_duration(2))?;
//! let build = service.create_task(NewTask::new("build").with_duration(3))?;
//! let report = service.add_dependency(build.id, design.id)?;
//! assert_eq!(report.project_duration, 5);
//! # Ok::<(), taskgraph_cpm::ServiceError>(())
//! ```

pub mod calendar;
pub mod clock;
pub mod config;
pub mod critical_path;
pub mod cycle_guard;
mod error;
mod interner;
pub mod logging;
mod models;
pub mod scheduler;
pub mod snapshot;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, EpochPolicy, SchedulerConfig};
pub use critical_path::{compute_schedule, CriticalPathError, Schedule, TaskTiming};
pub use error::{DependencyError, ErrorKind, StoreError, TaskError};
pub use interner::NodeId;
pub use models::{
    BulkCreateOutcome, BulkCreateRequest, CriticalPathSummary, Dependency, DependencyInfo,
    DerivedFields, IndexedDependency, NewTask, Task, TaskDetails, TaskDraft, TaskId, TaskRef,
    TaskUpdate,
};
pub use scheduler::{ScheduleError, ScheduleReport, ServiceError, TaskGraphService, TaskSchedule};
pub use snapshot::GraphSnapshot;
pub use store::{InMemoryTaskStore, TaskReader, TaskRepository, TaskWriter};
