// src/exec/task_runner.rs

//! Running one claimed task through the executor.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::engine::TaskOutcome;
use crate::exec::backend::TaskExecutor;
use crate::types::Task;

/// Perform a single task and translate whatever happens into a
/// [`TaskOutcome`].
///
/// The executor's future runs in its own Tokio task, so a panic inside it
/// (or inside `perform` itself) becomes `TaskOutcome::Faulted` instead of
/// tearing down the unit of work that claimed the task. Dropping the
/// returned future aborts that task; work already handed to
/// `spawn_blocking` runs to completion regardless.
pub async fn run_task<T, E>(executor: &E, task: &T) -> TaskOutcome
where
    T: Task,
    E: TaskExecutor<T> + ?Sized,
{
    info!(task = ?task, "starting task");

    let fut = match catch_unwind(AssertUnwindSafe(|| executor.perform(task.clone()))) {
        Ok(fut) => fut,
        Err(payload) => {
            let message = panic_message(&*payload);
            warn!(task = ?task, error = %message, "executor panicked before starting task");
            return TaskOutcome::Faulted(message);
        }
    };

    let mut handle = AbortOnDrop(tokio::spawn(fut));
    match (&mut handle.0).await {
        Ok(Ok(true)) => {
            debug!(task = ?task, "task finished successfully");
            TaskOutcome::Success
        }
        Ok(Ok(false)) => {
            warn!(task = ?task, "task failed; its dependents will not run");
            TaskOutcome::Failed
        }
        Ok(Err(err)) => {
            let message = format!("{err:#}");
            warn!(task = ?task, error = %message, "task executor returned an error");
            TaskOutcome::Faulted(message)
        }
        Err(join_err) => {
            let message = join_error_message(join_err);
            warn!(task = ?task, error = %message, "task executor did not finish");
            TaskOutcome::Faulted(message)
        }
    }
}

/// Aborts the spawned executor future when the unit awaiting it is dropped
/// (for instance because the caller gave up on `run_all`).
struct AbortOnDrop<R>(JoinHandle<R>);

impl<R> Drop for AbortOnDrop<R> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Human-readable description of a failed Tokio task.
pub fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(&*err.into_panic())
    } else {
        err.to_string()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
