// src/dag/mod.rs

//! Dependency graph bookkeeping.
//!
//! - [`lookup`] holds the `DependencyLookup` capability and a map-backed
//!   implementation.
//! - [`state`] contains the per-run pending / in-flight / completed
//!   partition and the mutex-guarded handle shared by units of work.
//! - [`diagnose`] explains a stall (cycle, self-dependency, missing
//!   reference, or only failed upstream tasks).

pub mod diagnose;
pub mod lookup;
pub mod state;

pub use diagnose::{StallCause, StallDiagnosis};
pub use lookup::{DependencyLookup, DependencyMap};
pub use state::{Claim, SchedulingState, SharedState, StateCounts};
