// src/engine/tally.rs

//! Pure aggregation of unit reports.
//!
//! The supervisor feeds every joined unit into a [`RunTally`]; once the run
//! has quiesced the tally decides whether `run_all` succeeds. No Tokio types
//! here, so the merge rules can be tested on their own.

use tracing::warn;

use crate::dag::StallDiagnosis;
use crate::engine::UnitReport;
use crate::errors::{ExecutorFault, RunError, UnsatisfiableDependency};
use crate::types::{FaultPolicy, Task};

#[derive(Debug)]
pub struct RunTally<T> {
    policy: FaultPolicy,
    units: usize,
    executed: usize,
    stalls: Vec<StallDiagnosis<T>>,
    faults: Vec<ExecutorFault<T>>,
    panics: Vec<String>,
}

impl<T: Task> RunTally<T> {
    pub fn new(policy: FaultPolicy) -> Self {
        Self {
            policy,
            units: 0,
            executed: 0,
            stalls: Vec::new(),
            faults: Vec::new(),
            panics: Vec::new(),
        }
    }

    pub fn record(&mut self, report: UnitReport<T>) {
        self.units += 1;
        self.executed += report.executed;

        if let Some(fault) = report.fault {
            self.faults.push(fault);
        }
        if let Some(stall) = report.stall {
            self.stalls.push(stall);
        }
    }

    /// A unit of work panicked outside the executor (e.g. in a dependency
    /// lookup).
    pub fn record_panic(&mut self, message: String) {
        self.units += 1;
        warn!(error = %message, "scheduler worker panicked");
        self.panics.push(message);
    }

    /// Units joined so far.
    pub fn units(&self) -> usize {
        self.units
    }

    /// Executor invocations across all units.
    pub fn executed(&self) -> usize {
        self.executed
    }

    pub fn stalls(&self) -> &[StallDiagnosis<T>] {
        &self.stalls
    }

    pub fn faults(&self) -> &[ExecutorFault<T>] {
        &self.faults
    }

    /// Final verdict of the run.
    ///
    /// Precedence: worker panics, then stall detections, then executor
    /// faults. The winning error still carries every detection and fault
    /// below it. Faults are dropped entirely under [`FaultPolicy::Ignore`].
    pub fn into_result(self) -> Result<(), RunError<T>> {
        let faults = match self.policy {
            FaultPolicy::Report => self.faults,
            FaultPolicy::Ignore => Vec::new(),
        };

        if !self.panics.is_empty() {
            return Err(RunError::WorkerPanicked {
                messages: self.panics,
                detections: self.stalls,
                faults,
            });
        }

        if !self.stalls.is_empty() {
            return Err(UnsatisfiableDependency {
                detections: self.stalls,
                faults,
            }
            .into());
        }

        if !faults.is_empty() {
            return Err(RunError::ExecutorFault { faults });
        }

        Ok(())
    }
}
