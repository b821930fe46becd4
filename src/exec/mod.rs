// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`backend`] provides the `TaskExecutor` trait plus the async-closure and
//!   blocking-closure adapters callers usually reach for.
//! - [`task_runner`] performs one claimed task and turns success, failure,
//!   errors and panics into a `TaskOutcome`.

pub mod backend;
pub mod task_runner;

pub use backend::{
    blocking_executor, executor_fn, BlockingExecutor, FnExecutor, PerformFuture, PerformOutput,
    TaskExecutor,
};
pub use task_runner::run_task;
