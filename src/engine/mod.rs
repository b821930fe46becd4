// src/engine/mod.rs

//! Scheduling engine for dagrun.
//!
//! A run is a set of cooperating *units of work* over one shared
//! [`SharedState`](crate::dag::SharedState):
//!
//! - [`unit`] is the claim / dispatch / react loop a single unit runs.
//! - [`tally`] is the pure aggregation of unit reports into the final
//!   result of a run.
//! - [`runtime`] hosts [`Runner`], the public entry point, and the supervisor
//!   that spawns units on demand and joins every one of them.

use crate::dag::StallDiagnosis;
use crate::errors::ExecutorFault;

/// Outcome of performing one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// The executor cleanly reported failure.
    Failed,
    /// The executor errored or panicked.
    Faulted(String),
}

/// Why a unit of work stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitExit {
    /// Nothing left pending.
    Drained,
    /// Nothing claimable, but other tasks were in flight; their units will
    /// claim again when they finish.
    Waiting,
    /// The task this unit executed failed (or faulted).
    TaskFailed,
    /// The run stalled, but only because of failed upstream tasks.
    Absorbed,
    /// The run stalled for a structural reason.
    Stalled,
}

/// Everything a unit of work reports back to the supervisor.
#[derive(Debug, Clone)]
pub struct UnitReport<T> {
    pub exit: UnitExit,
    /// Number of tasks this unit performed.
    pub executed: usize,
    pub fault: Option<ExecutorFault<T>>,
    pub stall: Option<StallDiagnosis<T>>,
}

impl<T> UnitReport<T> {
    pub fn new(exit: UnitExit, executed: usize) -> Self {
        Self {
            exit,
            executed,
            fault: None,
            stall: None,
        }
    }
}

pub mod runtime;
pub mod tally;
pub mod unit;

pub use runtime::Runner;
pub use tally::RunTally;
