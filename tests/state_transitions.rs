// tests/state_transitions.rs

use std::collections::HashSet;

use dagrun::dag::diagnose::diagnose;
use dagrun::dag::{Claim, SchedulingState, SharedState, StallCause, StateCounts};
use dagrun::engine::{RunTally, TaskOutcome, UnitExit, UnitReport};
use dagrun::exec::run_task;
use dagrun::{executor_fn, ExecutorFault, FaultPolicy, RunError, StallDiagnosis};
use dagrun_test_utils::builders::deps;
use dagrun_test_utils::init_tracing;

type Name = &'static str;

#[test]
fn claims_follow_submission_order_and_dependencies() {
    init_tracing();
    let lookup = deps(&[("a", &["b"]), ("b", &[]), ("c", &[])]);
    let mut state = SchedulingState::seed(["a", "b", "c"]);

    // a is first but blocked; b is the first claimable one.
    assert_eq!(state.try_claim_ready(&lookup), Claim::Ready("b"));
    assert_eq!(state.try_claim_ready(&lookup), Claim::Ready("c"));
    assert_eq!(state.try_claim_ready(&lookup), Claim::Waiting);

    assert!(state.mark_completed(&"b"));
    assert_eq!(state.try_claim_ready(&lookup), Claim::Ready("a"));
    assert!(state.mark_completed(&"a"));
    assert!(state.mark_completed(&"c"));

    assert_eq!(state.try_claim_ready(&lookup), Claim::Drained);
    assert_eq!(
        state.snapshot(),
        StateCounts {
            pending: 0,
            in_flight: 0,
            completed: 3,
            failed: 0
        }
    );
}

#[test]
fn completion_of_unclaimed_task_is_ignored() {
    init_tracing();
    let lookup = deps(&[]);
    let mut state = SchedulingState::seed(["a"]);

    assert!(!state.mark_completed(&"a"));
    assert!(!state.mark_failed(&"a"));
    assert!(state.is_pending(&"a"));

    assert_eq!(state.try_claim_ready(&lookup), Claim::Ready("a"));
    assert!(state.is_in_flight(&"a"));
    assert!(state.mark_completed(&"a"));
    assert!(!state.mark_completed(&"a"));
    assert!(state.is_completed(&"a"));
}

#[test]
fn failed_task_never_unblocks_dependents() {
    init_tracing();
    let lookup = deps(&[("a", &[]), ("b", &["a"])]);
    let mut state = SchedulingState::seed(["a", "b"]);

    assert_eq!(state.try_claim_ready(&lookup), Claim::Ready("a"));
    assert_eq!(state.poll_stall(&lookup), None);
    assert!(state.mark_failed(&"a"));
    assert!(state.is_failed(&"a"));
    assert!(!state.is_completed(&"a"));

    let diagnosis = state.poll_stall(&lookup).expect("b is stuck");
    assert_eq!(diagnosis.stuck, vec!["b"]);
    assert!(!diagnosis.is_structural());

    match state.try_claim_ready(&lookup) {
        Claim::Stalled(d) => assert_eq!(d, diagnosis),
        other => panic!("Expected Stalled, got: {:?}", other),
    }
    assert!(state.has_pending());
    assert!(!state.has_in_flight());
}

#[test]
fn duplicate_copies_stay_in_flight_until_both_finish() {
    init_tracing();
    let lookup = deps(&[("a", &[]), ("b", &["c"]), ("c", &["b"])]);
    let mut state = SchedulingState::seed(["a", "a", "b", "c"]);

    assert_eq!(state.try_claim_ready(&lookup), Claim::Ready("a"));
    assert_eq!(state.try_claim_ready(&lookup), Claim::Ready("a"));
    assert_eq!(state.snapshot().in_flight, 2);

    // The second copy is still running, so the b/c cycle is not a stall yet.
    assert!(state.mark_completed(&"a"));
    assert!(state.is_in_flight(&"a"));
    assert_eq!(state.poll_stall(&lookup), None);
    assert_eq!(state.try_claim_ready(&lookup), Claim::Waiting);

    assert!(state.mark_completed(&"a"));
    assert!(!state.has_in_flight());
    assert!(!state.mark_completed(&"a"));
    assert!(state.poll_stall(&lookup).is_some_and(|d| d.is_structural()));
}

#[test]
fn shared_state_clones_see_the_same_run() {
    init_tracing();
    let lookup = deps(&[("b", &["a"])]);
    let state = SharedState::seed(["a", "b"]);
    let other = state.clone();

    assert_eq!(state.try_claim_ready(&lookup), Claim::Ready("a"));
    assert!(other.has_in_flight());
    assert_eq!(other.pending_tasks(), vec!["b"]);

    assert!(other.mark_completed(&"a"));
    assert!(!state.has_in_flight());
    assert_eq!(state.try_claim_ready(&lookup), Claim::Ready("b"));
    assert!(!other.has_pending());
    assert!(state.mark_failed(&"b"));
    assert_eq!(
        other.snapshot(),
        StateCounts {
            pending: 0,
            in_flight: 0,
            completed: 1,
            failed: 1
        }
    );
}

#[test]
fn diagnose_reports_every_cause() {
    let lookup = deps(&[
        ("a", &["a"]),
        ("b", &["gone", "done"]),
        ("c", &["d"]),
        ("d", &["c"]),
        ("e", &["broken"]),
    ]);
    let pending = vec!["a", "b", "c", "d", "e"];
    let completed: HashSet<Name> = ["done"].into_iter().collect();
    let failed: HashSet<Name> = ["broken"].into_iter().collect();
    let in_flight = HashSet::new();

    let diagnosis = diagnose(&pending, &completed, &failed, &in_flight, &lookup);

    assert_eq!(diagnosis.stuck, pending);
    assert_eq!(
        diagnosis.causes,
        vec![
            StallCause::SelfDependency { task: "a" },
            StallCause::MissingDependency {
                task: "b",
                missing: "gone"
            },
            StallCause::Cycle {
                tasks: vec!["c", "d"]
            },
        ]
    );
}

#[test]
fn downstream_of_cycle_is_not_its_own_cause() {
    let lookup = deps(&[("x", &["y"]), ("y", &["x"]), ("z", &["x"])]);
    let pending = vec!["z", "x", "y"];
    let empty = HashSet::new();

    let diagnosis = diagnose(&pending, &empty, &empty, &empty, &lookup);

    assert_eq!(
        diagnosis.causes,
        vec![StallCause::Cycle {
            tasks: vec!["x", "y"]
        }]
    );
    let text = diagnosis.to_string();
    assert!(text.starts_with("3 stuck task(s)"), "text was: {text}");
}

fn fault(task: Name) -> ExecutorFault<Name> {
    ExecutorFault {
        task,
        message: "boom".to_string(),
    }
}

fn stall(task: Name) -> StallDiagnosis<Name> {
    StallDiagnosis {
        stuck: vec![task],
        causes: vec![StallCause::SelfDependency { task }],
    }
}

#[test]
fn tally_without_problems_is_ok() {
    let mut tally: RunTally<Name> = RunTally::new(FaultPolicy::Report);
    tally.record(UnitReport::new(UnitExit::Drained, 3));
    tally.record(UnitReport::new(UnitExit::Waiting, 1));
    tally.record(UnitReport::new(UnitExit::Absorbed, 0));

    assert_eq!(tally.units(), 3);
    assert_eq!(tally.executed(), 4);
    assert!(tally.into_result().is_ok());
}

#[test]
fn tally_prefers_stalls_over_faults() {
    let mut tally = RunTally::new(FaultPolicy::Report);

    let mut failed = UnitReport::new(UnitExit::TaskFailed, 1);
    failed.fault = Some(fault("a"));
    tally.record(failed);

    let mut stalled = UnitReport::new(UnitExit::Stalled, 0);
    stalled.stall = Some(stall("x"));
    tally.record(stalled.clone());
    tally.record(stalled);

    assert_eq!(tally.stalls().len(), 2);
    assert_eq!(tally.faults().len(), 1);

    match tally.into_result() {
        Err(RunError::UnsatisfiableDependency(inner)) => {
            assert_eq!(inner.detections.len(), 2);
            assert_eq!(inner.faults.len(), 1);
        }
        other => panic!("Expected UnsatisfiableDependency, got: {:?}", other),
    }
}

#[test]
fn tally_prefers_worker_panics_but_keeps_everything_else() {
    let mut tally = RunTally::new(FaultPolicy::Report);

    let mut stalled = UnitReport::new(UnitExit::Stalled, 0);
    stalled.stall = Some(stall("x"));
    tally.record(stalled);

    let mut failed = UnitReport::new(UnitExit::TaskFailed, 1);
    failed.fault = Some(fault("a"));
    tally.record(failed);

    tally.record_panic("panicked: lookup".to_string());

    let err = match tally.into_result() {
        Err(err) => err,
        Ok(()) => panic!("Expected WorkerPanicked, got Ok"),
    };
    assert_eq!(err.detections(), &[stall("x")]);
    assert_eq!(err.faults().len(), 1);
    assert_eq!(err.faults()[0].task, "a");
    match err {
        RunError::WorkerPanicked {
            messages,
            detections,
            faults,
        } => {
            assert_eq!(messages, vec!["panicked: lookup"]);
            assert_eq!(detections.len(), 1);
            assert_eq!(faults.len(), 1);
        }
        other => panic!("Expected WorkerPanicked, got: {:?}", other),
    }
}

#[test]
fn tally_worker_panic_drops_faults_when_ignored() {
    let mut tally = RunTally::new(FaultPolicy::Ignore);

    let mut failed = UnitReport::new(UnitExit::TaskFailed, 1);
    failed.fault = Some(fault("a"));
    tally.record(failed);
    tally.record_panic("panicked: lookup".to_string());

    match tally.into_result() {
        Err(RunError::WorkerPanicked { faults, .. }) => assert!(faults.is_empty()),
        other => panic!("Expected WorkerPanicked, got: {:?}", other),
    }
}

#[test]
fn tally_drops_faults_when_ignored() {
    let mut tally = RunTally::new(FaultPolicy::Ignore);

    let mut failed = UnitReport::new(UnitExit::TaskFailed, 1);
    failed.fault = Some(fault("a"));
    tally.record(failed);

    assert!(tally.into_result().is_ok());
}

#[tokio::test]
async fn run_task_maps_executor_results() {
    init_tracing();
    let executor = executor_fn(|task: Name| async move {
        match task {
            "ok" => Ok(true),
            "no" => Ok(false),
            _ => Err(std::io::Error::other("broken pipe")),
        }
    });

    assert_eq!(run_task(&executor, &"ok").await, TaskOutcome::Success);
    assert_eq!(run_task(&executor, &"no").await, TaskOutcome::Failed);
    match run_task(&executor, &"err").await {
        TaskOutcome::Faulted(message) => assert!(message.contains("broken pipe")),
        other => panic!("Expected Faulted, got: {:?}", other),
    }
}

#[tokio::test]
async fn run_task_contains_panics_before_the_future() {
    init_tracing();
    let executor = executor_fn(|task: Name| -> std::future::Ready<bool> {
        panic!("refusing {task}");
    });

    match run_task(&executor, &"x").await {
        TaskOutcome::Faulted(message) => assert!(message.contains("refusing x")),
        other => panic!("Expected Faulted, got: {:?}", other),
    }
}
