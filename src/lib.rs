// src/lib.rs

//! Run interdependent tasks concurrently, each one only after all of its
//! prerequisites succeeded.
//!
//! Callers supply two capabilities:
//! - a [`DependencyLookup`] that lists a task's direct prerequisites, and
//! - a [`TaskExecutor`] that performs a task and reports success/failure.
//!
//! [`Runner::run_all`] does the rest: it claims ready tasks, starts
//! independent ones concurrently, never runs a task whose prerequisite
//! failed, and reports cycles, self-dependencies and references to unknown
//! tasks as [`RunError::UnsatisfiableDependency`].
//!
//! ```no_run
//! use dagrun::{executor_fn, DependencyMap, Runner};
//!
//! # async fn demo() -> Result<(), dagrun::RunError<&'static str>> {
//! let deps = DependencyMap::new().with("c", ["a", "b"]);
//! let runner = Runner::new(deps, executor_fn(|task: &'static str| async move {
//!     println!("running {task}");
//!     true
//! }));
//! runner.run_all(["a", "b", "c"]).await
//! # }
//! ```

pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

pub use config::RunnerConfig;
pub use dag::{DependencyLookup, DependencyMap, StallCause, StallDiagnosis};
pub use engine::{Runner, TaskOutcome};
pub use errors::{DagrunError, ExecutorFault, RunError, UnsatisfiableDependency};
pub use exec::{blocking_executor, executor_fn, TaskExecutor};
pub use logging::init_logging;
pub use types::{FaultPolicy, LogLevel, Task};
