// src/types.rs

use std::fmt::Debug;
use std::hash::Hash;
use std::str::FromStr;

use serde::Deserialize;

/// Anything the runner can schedule.
///
/// Tasks are opaque: the runner only hashes, compares and clones them, and
/// uses `Debug` for logs and error messages. The blanket impl means callers
/// never implement this by hand.
pub trait Task: Clone + Eq + Hash + Send + Sync + Debug + 'static {}

impl<T> Task for T where T: Clone + Eq + Hash + Send + Sync + Debug + 'static {}

/// What to do when a task executor errors or panics instead of returning a
/// clean `true` / `false`.
///
/// - `Report`: the task is treated as failed (its dependents never run) and
///   the fault is returned to the caller of `run_all` (default).
/// - `Ignore`: the task is treated as failed and the fault is only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    #[default]
    Report,
    Ignore,
}

impl FromStr for FaultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "report" => Ok(FaultPolicy::Report),
            "ignore" => Ok(FaultPolicy::Ignore),
            other => Err(format!(
                "invalid executor_faults: {other} (expected \"report\" or \"ignore\")"
            )),
        }
    }
}

/// Log level accepted by [`crate::logging::init_logging`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("invalid log level: {other}")),
        }
    }
}
