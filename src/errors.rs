// src/errors.rs

//! Crate-wide error types.
//!
//! [`DagrunError`] covers configuration and setup. [`RunError`] is what a
//! single `run_all` call fails with; it is generic over the task type so
//! callers get their own tasks back in the diagnostics.

use std::fmt;

use thiserror::Error;

use crate::dag::diagnose::StallDiagnosis;

#[derive(Error, Debug)]
pub enum DagrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagrunError>;

/// A task whose executor returned an error or panicked.
#[derive(Error, Debug, Clone)]
#[error("executor fault in task {task:?}: {message}")]
pub struct ExecutorFault<T> {
    pub task: T,
    pub message: String,
}

/// No task could be claimed and none was in flight, for structural reasons.
///
/// Every stall detection made during the run is kept in `detections`
/// (one entry per detecting unit of work). Executor faults seen in the same
/// run are carried along so they are not lost behind the stall.
#[derive(Debug, Clone)]
pub struct UnsatisfiableDependency<T> {
    pub detections: Vec<StallDiagnosis<T>>,
    pub faults: Vec<ExecutorFault<T>>,
}

impl<T> UnsatisfiableDependency<T> {
    /// Iterate every cause across all detections.
    pub fn causes(&self) -> impl Iterator<Item = &crate::dag::diagnose::StallCause<T>> {
        self.detections.iter().flat_map(|d| d.causes.iter())
    }
}

impl<T: fmt::Debug> fmt::Display for UnsatisfiableDependency<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tasks with dependencies that can't be satisfied ({} detection(s))",
            self.detections.len()
        )?;
        if let Some(first) = self.detections.first() {
            write!(f, ": {first}")?;
        }
        if !self.faults.is_empty() {
            write!(f, " [{} executor fault(s) in the same run]", self.faults.len())?;
        }
        Ok(())
    }
}

impl<T: fmt::Debug> std::error::Error for UnsatisfiableDependency<T> {}

/// Failure of a whole `run_all` invocation.
#[derive(Error, Debug)]
pub enum RunError<T> {
    #[error("{0}")]
    UnsatisfiableDependency(UnsatisfiableDependency<T>),

    #[error("executor fault(s) in {} task(s)", .faults.len())]
    ExecutorFault { faults: Vec<ExecutorFault<T>> },

    /// A unit of work panicked outside the executor. Whatever else the run
    /// recorded before quiescing is carried along.
    #[error("scheduler worker panicked: {}", .messages.join("; "))]
    WorkerPanicked {
        messages: Vec<String>,
        detections: Vec<StallDiagnosis<T>>,
        faults: Vec<ExecutorFault<T>>,
    },

    #[error("building task runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl<T> From<UnsatisfiableDependency<T>> for RunError<T> {
    fn from(err: UnsatisfiableDependency<T>) -> Self {
        RunError::UnsatisfiableDependency(err)
    }
}

impl<T> RunError<T> {
    /// The stall detections, if this is an unsatisfiable-dependency error.
    pub fn as_unsatisfiable(&self) -> Option<&UnsatisfiableDependency<T>> {
        match self {
            RunError::UnsatisfiableDependency(inner) => Some(inner),
            _ => None,
        }
    }

    /// All executor faults carried by this error, whatever its kind.
    pub fn faults(&self) -> &[ExecutorFault<T>] {
        match self {
            RunError::UnsatisfiableDependency(inner) => &inner.faults,
            RunError::ExecutorFault { faults } | RunError::WorkerPanicked { faults, .. } => faults,
            RunError::Runtime(_) => &[],
        }
    }

    /// All stall detections carried by this error, whatever its kind.
    pub fn detections(&self) -> &[StallDiagnosis<T>] {
        match self {
            RunError::UnsatisfiableDependency(inner) => &inner.detections,
            RunError::WorkerPanicked { detections, .. } => detections,
            RunError::ExecutorFault { .. } | RunError::Runtime(_) => &[],
        }
    }
}
