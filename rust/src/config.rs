//! Configuration for the task graph service.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! default_duration_days = 1
//! default_due_date_business_days = 5
//! verbosity = 1
//!
//! [epoch]
//! kind = "fixed"
//! date = "2025-01-06"
//! ```

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where day zero of the schedule sits on the calendar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EpochPolicy {
    /// The UTC date of the earliest task creation timestamp.
    #[default]
    EarliestCreation,
    /// A fixed project start date.
    Fixed { date: NaiveDate },
}

/// Scheduling and task-default settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    pub epoch: EpochPolicy,
    /// Duration given to tasks created without one.
    pub default_duration_days: u32,
    /// Business days between creation and the default due date.
    pub default_due_date_business_days: u32,
    /// 0 = warnings only, 1 = changes, 2 = checks, 3 = debug.
    pub verbosity: u8,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            epoch: EpochPolicy::EarliestCreation,
            default_duration_days: 1,
            default_due_date_business_days: 5,
            verbosity: 0,
        }
    }
}

impl SchedulerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SchedulerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_duration_days == 0 {
            return Err(ConfigError::Invalid(
                "default_duration_days must be >= 1 (got 0)".to_string(),
            ));
        }
        if self.verbosity > crate::logging::VERBOSITY_DEBUG {
            return Err(ConfigError::Invalid(format!(
                "verbosity must be between 0 and {} (got {})",
                crate::logging::VERBOSITY_DEBUG,
                self.verbosity
            )));
        }
        Ok(())
    }
}
