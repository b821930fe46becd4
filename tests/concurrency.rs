// tests/concurrency.rs

mod common;
use crate::common::TestResult;

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dagrun::{blocking_executor, executor_fn, DependencyMap, Runner, RunnerConfig};
use dagrun_test_utils::builders::{deps, numbered_tasks};
use dagrun_test_utils::recording_executor::{Name, Recorder, RecordingExecutor};
use dagrun_test_utils::{init_tracing, with_timeout};
use tokio::sync::Barrier;

#[tokio::test]
async fn independent_tasks_run_at_the_same_time() -> TestResult {
    init_tracing();

    // Both tasks plus the test itself must meet at the barrier, which is
    // only possible if a and b are executing simultaneously.
    let barrier = Arc::new(Barrier::new(3));
    let exec_barrier = Arc::clone(&barrier);
    let runner = Runner::new(
        deps(&[("a", &[]), ("b", &[])]),
        executor_fn(move |_task: Name| {
            let barrier = Arc::clone(&exec_barrier);
            async move {
                barrier.wait().await;
                true
            }
        }),
    );

    let (result, _) =
        with_timeout(async { tokio::join!(runner.run_all(["a", "b"]), barrier.wait()) }).await;
    result?;
    Ok(())
}

#[tokio::test]
async fn dependent_starts_while_unrelated_task_is_running() -> TestResult {
    init_tracing();

    // a cannot finish until c is running, and c needs b. A scheduler that
    // waited for a before looking at c would never get there.
    let barrier = Arc::new(Barrier::new(2));
    let exec_barrier = Arc::clone(&barrier);
    let recorder = Recorder::new();
    let exec_recorder = recorder.clone();
    let inner = RecordingExecutor::new(exec_recorder);

    let runner = Runner::new(
        deps(&[("a", &[]), ("b", &[]), ("c", &["b"])]),
        executor_fn(move |task: Name| {
            let barrier = Arc::clone(&exec_barrier);
            let step = dagrun::TaskExecutor::perform(&inner, task);
            async move {
                if task == "a" || task == "c" {
                    barrier.wait().await;
                }
                step.await
            }
        }),
    );

    with_timeout(runner.run_all(["a", "b", "c"])).await?;

    assert!(recorder.finished_before_started("b", "c"));
    assert_eq!(recorder.started().len(), 3);
    Ok(())
}

#[tokio::test]
async fn max_concurrency_one_runs_tasks_one_at_a_time() -> TestResult {
    init_tracing();

    let tasks = ["a", "b", "c", "d"];
    let recorder = Recorder::new();
    let config = RunnerConfig::default().with_max_concurrency(NonZeroUsize::MIN);
    let runner = Runner::with_config(
        deps(&[("a", &[]), ("b", &[]), ("c", &[]), ("d", &["a"])]),
        RecordingExecutor::new(recorder.clone())
            .delayed_all(&tasks, Duration::from_millis(10)),
        config,
    );

    with_timeout(runner.run_all(tasks)).await?;

    assert_eq!(recorder.max_running(), 1);
    assert_eq!(recorder.started().len(), 4);
    assert!(recorder.finished_before_started("a", "d"));
    Ok(())
}

#[tokio::test]
async fn max_concurrency_caps_parallelism() -> TestResult {
    init_tracing();

    let tasks = numbered_tasks(8);
    let recorder = Recorder::new();
    let limit = NonZeroUsize::new(2).ok_or("2 is non-zero")?;
    let runner = Runner::with_config(
        DependencyMap::new(),
        RecordingExecutor::new(recorder.clone())
            .delayed_all(&tasks, Duration::from_millis(20)),
        RunnerConfig::default().with_max_concurrency(limit),
    );

    with_timeout(runner.run_all(tasks.clone())).await?;

    assert!(recorder.max_running() <= 2);
    assert_eq!(recorder.started().len(), tasks.len());
    Ok(())
}

#[tokio::test]
async fn blocking_executor_runs_tasks_in_parallel() -> TestResult {
    init_tracing();

    // a std barrier inside spawn_blocking: deadlocks unless both closures
    // occupy a blocking thread at once.
    let barrier = std::sync::Barrier::new(2);
    let runner = Runner::new(
        deps(&[("a", &[]), ("b", &[]), ("c", &["a", "b"])]),
        blocking_executor(move |task: Name| {
            if task != "c" {
                barrier.wait();
            }
            true
        }),
    );

    with_timeout(runner.run_all(["a", "b", "c"])).await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tree_on_multi_threaded_runtime() -> TestResult {
    init_tracing();

    // t(i) depends on its parent t((i - 1) / 2).
    let tasks = numbered_tasks(63);
    let mut table = DependencyMap::new();
    for (i, task) in tasks.iter().enumerate().skip(1) {
        table.insert(*task, [tasks[(i - 1) / 2]]);
    }

    let recorder = Recorder::new();
    let runner = Runner::new(
        table.clone(),
        RecordingExecutor::new(recorder.clone())
            .delayed_all(&tasks, Duration::from_millis(5)),
    );

    with_timeout(runner.run_all(tasks.clone())).await?;

    assert_eq!(recorder.started().len(), tasks.len());
    assert!(recorder.max_running() > 1);
    for task in &tasks {
        for dep in table.dependencies_of(task) {
            assert!(recorder.finished_before_started(*dep, *task));
        }
    }
    Ok(())
}

#[tokio::test]
async fn dropping_the_run_aborts_running_executors() -> TestResult {
    init_tracing();

    let finished = Arc::new(AtomicBool::new(false));
    let exec_finished = Arc::clone(&finished);
    let runner = Runner::new(
        deps(&[("b", &["a"])]),
        executor_fn(move |_task: Name| {
            let finished = Arc::clone(&exec_finished);
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                finished.store(true, Ordering::SeqCst);
                true
            }
        }),
    );

    let outcome =
        tokio::time::timeout(Duration::from_millis(30), runner.run_all(["a", "b"])).await;
    assert!(outcome.is_err(), "run should still be busy with a");

    // Well past the point where a would have finished had it kept running.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!finished.load(Ordering::SeqCst));
    Ok(())
}
