// src/engine/unit.rs

//! One unit of work: claim a ready task, ask for a sibling, execute, react.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

use crate::dag::{Claim, DependencyLookup, SharedState, StallDiagnosis};
use crate::engine::{TaskOutcome, UnitExit, UnitReport};
use crate::errors::ExecutorFault;
use crate::exec::{run_task, TaskExecutor};
use crate::types::Task;

/// Everything every unit of one run shares.
pub struct UnitContext<T: Task, L, E> {
    pub state: SharedState<T>,
    pub lookup: Arc<L>,
    pub executor: Arc<E>,
    /// One message per successful claim: "spawn another claim attempt".
    pub fan_out: mpsc::UnboundedSender<()>,
}

/// Run one unit of work to completion.
///
/// The loop:
/// 1. claim the first ready task (or stop: drained, waiting, stalled);
/// 2. request a sibling unit so other ready tasks start right away;
/// 3. perform the task outside the state lock;
/// 4. on success mark it completed and go back to 1; on failure mark it
///    failed, check once for a stall, and stop.
pub async fn run_unit<T, L, E>(ctx: Arc<UnitContext<T, L, E>>) -> UnitReport<T>
where
    T: Task,
    L: DependencyLookup<T>,
    E: TaskExecutor<T>,
{
    let mut executed = 0;

    loop {
        let task = match ctx.state.try_claim_ready(ctx.lookup.as_ref()) {
            Claim::Ready(task) => task,
            Claim::Drained => {
                trace!(executed, "nothing pending; unit finished");
                return UnitReport::new(UnitExit::Drained, executed);
            }
            Claim::Waiting => {
                trace!(executed, "nothing claimable while tasks are in flight; unit stopping");
                return UnitReport::new(UnitExit::Waiting, executed);
            }
            Claim::Stalled(diagnosis) => return stall_report(diagnosis, executed),
        };

        if ctx.fan_out.send(()).is_err() {
            warn!(task = ?task, "supervisor is gone; fan-out request dropped");
        }

        executed += 1;
        let fault = match run_task(ctx.executor.as_ref(), &task).await {
            TaskOutcome::Success => {
                ctx.state.mark_completed(&task);
                continue;
            }
            TaskOutcome::Failed => None,
            TaskOutcome::Faulted(message) => Some(ExecutorFault {
                task: task.clone(),
                message,
            }),
        };

        ctx.state.mark_failed(&task);

        // If this was the last task in flight nobody else will claim again,
        // so this is the only chance to notice a stall.
        let mut report = match ctx.state.poll_stall(ctx.lookup.as_ref()) {
            Some(diagnosis) => stall_report(diagnosis, executed),
            None => UnitReport::new(UnitExit::TaskFailed, executed),
        };
        report.fault = fault;
        return report;
    }
}

fn stall_report<T: Task>(diagnosis: StallDiagnosis<T>, executed: usize) -> UnitReport<T> {
    if !diagnosis.is_structural() {
        warn!(
            stuck = ?diagnosis.stuck,
            "remaining tasks are blocked by failed dependencies; they will not run"
        );
        return UnitReport::new(UnitExit::Absorbed, executed);
    }

    for cause in &diagnosis.causes {
        error!(cause = %cause, "unsatisfiable dependency");
    }
    debug!(stuck = ?diagnosis.stuck, "run stalled");

    let mut report = UnitReport::new(UnitExit::Stalled, executed);
    report.stall = Some(diagnosis);
    report
}
