// src/engine/runtime.rs

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::dag::{DependencyLookup, SharedState};
use crate::engine::tally::RunTally;
use crate::engine::unit::{run_unit, UnitContext};
use crate::engine::UnitReport;
use crate::errors::RunError;
use crate::exec::task_runner::join_error_message;
use crate::exec::TaskExecutor;
use crate::types::Task;

/// Runs a set of interdependent tasks, each after all of its prerequisites
/// succeeded, with independent tasks running concurrently.
///
/// A `Runner` holds only the two capabilities and the config; every
/// [`run_all`](Runner::run_all) call gets fresh scheduling state, so one
/// runner can be reused for many independent runs.
pub struct Runner<T, L, E> {
    lookup: Arc<L>,
    executor: Arc<E>,
    config: RunnerConfig,
    _task: PhantomData<fn() -> T>,
}

impl<T, L, E> fmt::Debug for Runner<T, L, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T, L, E> Runner<T, L, E>
where
    T: Task,
    L: DependencyLookup<T>,
    E: TaskExecutor<T>,
{
    pub fn new(lookup: L, executor: E) -> Self {
        Self::with_config(lookup, executor, RunnerConfig::default())
    }

    pub fn with_config(lookup: L, executor: E, config: RunnerConfig) -> Self {
        Self {
            lookup: Arc::new(lookup),
            executor: Arc::new(executor),
            config,
            _task: PhantomData,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every task in `tasks` and resolve once the run has quiesced.
    ///
    /// Resolves `Ok(())` when every task either completed or was skipped
    /// because something upstream failed. Fails with
    /// [`RunError::UnsatisfiableDependency`] when the graph stalls because of
    /// a cycle, a self-dependency or a reference to a task that is not in
    /// `tasks`; every detection from every unit of work is kept.
    ///
    /// Listing a task more than once runs it once per occurrence; the first
    /// successful copy unblocks its dependents.
    ///
    /// Dropping the returned future cancels the run: every unit and every
    /// executor future still in progress is aborted.
    pub async fn run_all<I>(&self, tasks: I) -> Result<(), RunError<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let state = SharedState::seed(tasks);
        let submitted = state.snapshot().pending;

        info!(
            tasks = submitted,
            max_concurrency = ?self.config.max_concurrency,
            "starting run"
        );

        if submitted == 0 {
            info!("no tasks submitted; nothing to run");
            return Ok(());
        }

        let (fan_out_tx, fan_out_rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(UnitContext {
            state: state.clone(),
            lookup: Arc::clone(&self.lookup),
            executor: Arc::clone(&self.executor),
            fan_out: fan_out_tx,
        });

        let tally = self.supervise(ctx, fan_out_rx).await;

        if state.has_in_flight() {
            // Only a panicking unit can leave one behind.
            warn!("run quiesced with tasks still marked in flight");
        }
        if state.has_pending() {
            debug!(tasks = ?state.pending_tasks(), "tasks left unrun");
        }

        let counts = state.snapshot();
        info!(
            completed = counts.completed,
            failed = counts.failed,
            not_run = counts.pending,
            executed = tally.executed(),
            units = tally.units(),
            "run finished"
        );

        tally.into_result()
    }

    /// Blocking variant of [`run_all`](Runner::run_all).
    ///
    /// Builds a multi-threaded Tokio runtime for the duration of the call.
    /// Must not be called from within an async context.
    pub fn run_all_blocking<I>(&self, tasks: I) -> Result<(), RunError<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("dagrun-worker")
            .build()?;

        runtime.block_on(self.run_all(tasks))
    }

    /// Spawn units on demand and join every one of them.
    ///
    /// Starts with a single claim attempt; each successful claim sends one
    /// fan-out request. Requests beyond `max_concurrency` live units are
    /// deferred until a unit finishes. Returns once no unit is alive and no
    /// request is outstanding.
    async fn supervise(
        &self,
        ctx: Arc<UnitContext<T, L, E>>,
        mut fan_out_rx: mpsc::UnboundedReceiver<()>,
    ) -> RunTally<T> {
        let limit = self.config.unit_limit();
        let mut tally = RunTally::new(self.config.fault_policy);
        let mut units: JoinSet<UnitReport<T>> = JoinSet::new();
        let mut deferred: usize = 1;

        loop {
            while deferred > 0 && units.len() < limit {
                units.spawn(run_unit(Arc::clone(&ctx)));
                deferred -= 1;
            }

            if units.is_empty() {
                // A unit's last fan-out request may land after we saw the
                // unit itself finish.
                while fan_out_rx.try_recv().is_ok() {
                    deferred += 1;
                }
                if deferred == 0 {
                    break;
                }
                continue;
            }

            tokio::select! {
                biased;

                Some(()) = fan_out_rx.recv() => {
                    deferred += 1;
                }

                Some(joined) = units.join_next() => match joined {
                    Ok(report) => {
                        debug!(exit = ?report.exit, executed = report.executed, "unit finished");
                        tally.record(report);
                    }
                    Err(err) => tally.record_panic(join_error_message(err)),
                },

                else => break,
            }
        }

        tally
    }
}
