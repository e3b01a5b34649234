//! Calendar conversions for the schedule.
//!
//! The scheduler works in whole-day offsets from a project epoch. This module
//! picks the epoch, turns offsets into dates, and computes the default due
//! date for new tasks.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::config::EpochPolicy;

/// Pick the project epoch for a set of task creation dates.
///
/// Returns `None` for an empty project under [`EpochPolicy::EarliestCreation`].
pub fn project_epoch<I>(policy: &EpochPolicy, created_on: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = NaiveDate>,
{
    match policy {
        EpochPolicy::EarliestCreation => created_on.into_iter().min(),
        EpochPolicy::Fixed { date } => Some(*date),
    }
}

/// `epoch + offset` days, or `None` past chrono's representable range.
pub fn offset_to_date(epoch: NaiveDate, offset_days: u64) -> Option<NaiveDate> {
    epoch.checked_add_days(Days::new(offset_days))
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The date `business_days` working days (Mon–Fri) after `today`.
///
/// Zero returns `today` unchanged, even on a weekend.
pub fn default_due_date(today: NaiveDate, business_days: u32) -> NaiveDate {
    let mut date = today;
    let mut remaining = business_days;
    while remaining > 0 {
        date = match date.succ_opt() {
            Some(next) => next,
            None => return date,
        };
        if !is_weekend(date) {
            remaining -= 1;
        }
    }
    date
}
