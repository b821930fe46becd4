// src/dag/state.rs

//! Per-run scheduling state.
//!
//! Every submitted task is in exactly one of `pending`, `in_flight` or
//! `completed` at any time, and only ever moves forward through them. A task
//! whose executor fails leaves `in_flight` and lands in `failed`, which is
//! never claimable and only feeds stall diagnosis.
//!
//! Submitting the same task twice yields two pending entries. Both may be
//! claimed, so `in_flight` counts copies and a task only leaves it once
//! every copy has finished.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::dag::diagnose::{diagnose, StallDiagnosis};
use crate::dag::lookup::DependencyLookup;
use crate::types::Task;

/// Result of one claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim<T> {
    /// This task was moved from pending to in-flight and must be executed
    /// by the caller.
    Ready(T),
    /// Nothing is left pending.
    Drained,
    /// Nothing is claimable yet, but other tasks are still in flight.
    Waiting,
    /// Nothing is claimable and nothing is in flight.
    Stalled(StallDiagnosis<T>),
}

/// Sizes of each partition, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateCounts {
    pub pending: usize,
    pub in_flight: usize,
    pub completed: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct SchedulingState<T: Task> {
    /// Submission order is kept; the first claimable task wins.
    pending: Vec<T>,
    /// Running copies per task.
    in_flight: HashMap<T, usize>,
    completed: HashSet<T>,
    failed: HashSet<T>,
}

impl<T: Task> SchedulingState<T> {
    /// Fresh state with every task pending.
    pub fn seed(tasks: impl IntoIterator<Item = T>) -> Self {
        Self {
            pending: tasks.into_iter().collect(),
            in_flight: HashMap::new(),
            completed: HashSet::new(),
            failed: HashSet::new(),
        }
    }

    /// Claim the first pending task whose prerequisites are all completed.
    pub fn try_claim_ready<L>(&mut self, lookup: &L) -> Claim<T>
    where
        L: DependencyLookup<T> + ?Sized,
    {
        if self.pending.is_empty() {
            return Claim::Drained;
        }

        match self.first_claimable(lookup) {
            Some(pos) => {
                let task = self.pending.remove(pos);
                debug!(task = ?task, "dependencies satisfied; marking in flight");
                *self.in_flight.entry(task.clone()).or_insert(0) += 1;
                Claim::Ready(task)
            }
            None if !self.in_flight.is_empty() => Claim::Waiting,
            None => Claim::Stalled(self.diagnose(lookup)),
        }
    }

    /// Move an in-flight task to completed.
    ///
    /// Returns `false` (and changes nothing) if the task was not in flight.
    pub fn mark_completed(&mut self, task: &T) -> bool {
        if !self.release(task) {
            warn!(task = ?task, "completion for task that is not in flight; ignoring");
            return false;
        }
        debug!(task = ?task, "task completed");
        self.completed.insert(task.clone());
        true
    }

    /// Drop an in-flight task whose execution failed.
    ///
    /// The task never reaches `completed` (unless a duplicate copy of it
    /// succeeds), so its dependents stay pending forever.
    pub fn mark_failed(&mut self, task: &T) -> bool {
        if !self.release(task) {
            warn!(task = ?task, "failure for task that is not in flight; ignoring");
            return false;
        }
        self.failed.insert(task.clone());
        true
    }

    /// Pending tasks in submission order.
    pub fn pending_tasks(&self) -> Vec<T> {
        self.pending.clone()
    }

    /// Stall check without claiming: `Some` if tasks are pending, none is
    /// claimable and nothing is in flight.
    pub fn poll_stall<L>(&self, lookup: &L) -> Option<StallDiagnosis<T>>
    where
        L: DependencyLookup<T> + ?Sized,
    {
        if self.pending.is_empty()
            || !self.in_flight.is_empty()
            || self.first_claimable(lookup).is_some()
        {
            return None;
        }
        Some(self.diagnose(lookup))
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn has_in_flight(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn is_pending(&self, task: &T) -> bool {
        self.pending.contains(task)
    }

    pub fn is_in_flight(&self, task: &T) -> bool {
        self.in_flight.contains_key(task)
    }

    pub fn is_completed(&self, task: &T) -> bool {
        self.completed.contains(task)
    }

    pub fn is_failed(&self, task: &T) -> bool {
        self.failed.contains(task)
    }

    pub fn snapshot(&self) -> StateCounts {
        StateCounts {
            pending: self.pending.len(),
            in_flight: self.in_flight.values().sum(),
            completed: self.completed.len(),
            failed: self.failed.len(),
        }
    }

    /// Retire one running copy of `task`.
    fn release(&mut self, task: &T) -> bool {
        match self.in_flight.get_mut(task) {
            Some(copies) if *copies > 1 => *copies -= 1,
            Some(_) => {
                self.in_flight.remove(task);
            }
            None => return false,
        }
        true
    }

    fn first_claimable<L>(&self, lookup: &L) -> Option<usize>
    where
        L: DependencyLookup<T> + ?Sized,
    {
        self.pending.iter().position(|task| {
            lookup
                .direct_prerequisites_of(task)
                .iter()
                .all(|dep| self.completed.contains(dep))
        })
    }

    fn diagnose<L>(&self, lookup: &L) -> StallDiagnosis<T>
    where
        L: DependencyLookup<T> + ?Sized,
    {
        let in_flight: HashSet<T> = self.in_flight.keys().cloned().collect();
        diagnose(
            &self.pending,
            &self.completed,
            &self.failed,
            &in_flight,
            lookup,
        )
    }
}

/// [`SchedulingState`] behind a mutex, shared by every unit of work of one
/// run.
///
/// Each method takes the lock for exactly one transition or query. The lock
/// is never held while a task executes.
#[derive(Debug)]
pub struct SharedState<T: Task> {
    inner: Arc<Mutex<SchedulingState<T>>>,
}

impl<T: Task> Clone for SharedState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Task> SharedState<T> {
    pub fn seed(tasks: impl IntoIterator<Item = T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulingState::seed(tasks))),
        }
    }

    pub fn try_claim_ready<L>(&self, lookup: &L) -> Claim<T>
    where
        L: DependencyLookup<T> + ?Sized,
    {
        self.lock().try_claim_ready(lookup)
    }

    pub fn mark_completed(&self, task: &T) -> bool {
        self.lock().mark_completed(task)
    }

    pub fn mark_failed(&self, task: &T) -> bool {
        self.lock().mark_failed(task)
    }

    pub fn poll_stall<L>(&self, lookup: &L) -> Option<StallDiagnosis<T>>
    where
        L: DependencyLookup<T> + ?Sized,
    {
        self.lock().poll_stall(lookup)
    }

    pub fn has_pending(&self) -> bool {
        self.lock().has_pending()
    }

    pub fn has_in_flight(&self) -> bool {
        self.lock().has_in_flight()
    }

    pub fn pending_tasks(&self) -> Vec<T> {
        self.lock().pending_tasks()
    }

    pub fn snapshot(&self) -> StateCounts {
        self.lock().snapshot()
    }

    // A panic inside a dependency lookup happens before any mutation, so a
    // poisoned lock still guards consistent state.
    fn lock(&self) -> MutexGuard<'_, SchedulingState<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
