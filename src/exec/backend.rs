// src/exec/backend.rs

//! Pluggable task executor abstraction.
//!
//! The runner talks to a `TaskExecutor` and never cares how the work is
//! done. Two adapters cover the common cases:
//!
//! - [`executor_fn`] wraps an async closure.
//! - [`blocking_executor`] wraps a synchronous closure and runs it on
//!   tokio's blocking pool, so slow CPU-bound or blocking work does not
//!   starve the scheduler.
//!
//! Tests can provide their own implementation that records calls, fails on
//! demand, or waits on a barrier.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;

use crate::exec::task_runner::join_error_message;

/// Future returned by [`TaskExecutor::perform`].
///
/// - `Ok(true)`: the task succeeded.
/// - `Ok(false)`: the task failed; its dependents will never run.
/// - `Err(_)`: the executor itself broke. Treated like a failure, and
///   additionally reported to the caller unless faults are ignored.
pub type PerformFuture = Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'static>>;

/// Trait abstracting how a single task is performed.
pub trait TaskExecutor<T>: Send + Sync + 'static {
    /// Start performing `task`.
    ///
    /// The returned future must eventually resolve; a future that never
    /// resolves keeps the whole run waiting.
    fn perform(&self, task: T) -> PerformFuture;
}

impl<T, E> TaskExecutor<T> for Arc<E>
where
    E: TaskExecutor<T> + ?Sized,
{
    fn perform(&self, task: T) -> PerformFuture {
        (**self).perform(task)
    }
}

/// Values an executor closure may return.
pub trait PerformOutput {
    fn into_result(self) -> anyhow::Result<bool>;
}

impl PerformOutput for bool {
    fn into_result(self) -> anyhow::Result<bool> {
        Ok(self)
    }
}

impl<E> PerformOutput for Result<bool, E>
where
    E: Into<anyhow::Error>,
{
    fn into_result(self) -> anyhow::Result<bool> {
        self.map_err(Into::into)
    }
}

/// Executor backed by an async closure.
pub struct FnExecutor<F> {
    f: F,
}

/// Wrap an async closure `Fn(T) -> impl Future<Output = bool>` (or
/// `Result<bool, E>`) as a [`TaskExecutor`].
pub fn executor_fn<F>(f: F) -> FnExecutor<F> {
    FnExecutor { f }
}

impl<T, F, Fut> TaskExecutor<T> for FnExecutor<F>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: PerformOutput,
{
    fn perform(&self, task: T) -> PerformFuture {
        let fut = (self.f)(task);
        Box::pin(async move { fut.await.into_result() })
    }
}

/// Executor backed by a synchronous closure run via `spawn_blocking`.
pub struct BlockingExecutor<F> {
    f: Arc<F>,
}

/// Wrap a synchronous closure `Fn(T) -> bool` (or `Result<bool, E>`) as a
/// [`TaskExecutor`].
pub fn blocking_executor<F>(f: F) -> BlockingExecutor<F> {
    BlockingExecutor { f: Arc::new(f) }
}

impl<T, F, O> TaskExecutor<T> for BlockingExecutor<F>
where
    T: Send + 'static,
    F: Fn(T) -> O + Send + Sync + 'static,
    O: PerformOutput + Send + 'static,
{
    fn perform(&self, task: T) -> PerformFuture {
        let f = Arc::clone(&self.f);

        Box::pin(async move {
            let output = tokio::task::spawn_blocking(move || f(task))
                .await
                .map_err(|e| anyhow!("blocking executor: {}", join_error_message(e)))?;
            output.into_result()
        })
    }
}
