//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Verbosity levels:
//! - 0: SILENT (warnings and errors only)
//! - 1: CHANGES (mutations and recompute summaries)
//! - 2: CHECKS (validation decisions, per-pass details)
//! - 3: DEBUG (full algorithm internals)
//!
//! The `TASKGRAPH_LOG` environment variable (an `EnvFilter` directive such as
//! `taskgraph_cpm=debug`) takes precedence over the configured verbosity.
//! Logs go to stderr.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Verbosity level constants.
pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

pub const LOG_ENV_VAR: &str = "TASKGRAPH_LOG";

/// Map a verbosity level to the most detailed `tracing` level it enables.
pub fn level_for_verbosity(verbosity: u8) -> Level {
    match verbosity {
        VERBOSITY_SILENT => Level::WARN,
        VERBOSITY_CHANGES => Level::INFO,
        VERBOSITY_CHECKS => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn filter_for(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity).as_str().to_lowercase()))
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed (for example by a
/// test harness), in which case the existing one is left alone.
pub fn init_logging(verbosity: u8) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbosity))
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
