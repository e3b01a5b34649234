//! Recompute orchestration and the task graph service.
//!
//! [`recompute`] runs one scheduling pass inside a store transaction;
//! [`TaskGraphService`] wraps every public mutation so that each one is
//! followed by such a pass before it commits.

mod recompute;
mod service;

pub use recompute::{plan, recompute, ScheduleError, ScheduleReport, TaskSchedule};
pub use service::{ServiceError, TaskGraphService};
