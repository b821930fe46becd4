use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use dagrun::exec::{PerformFuture, TaskExecutor};

pub type Name = &'static str;

/// Something observable that happened inside the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Started(Name),
    Finished(Name),
}

/// Shared, thread-safe log of executor events.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
    running: Arc<AtomicUsize>,
    max_running: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn start(&self, task: Name) {
        self.events.lock().unwrap().push(Event::Started(task));
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
    }

    fn finish(&self, task: Name) {
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(Event::Finished(task));
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Tasks in the order they were started.
    pub fn started(&self) -> Vec<Name> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started(t) => Some(t),
                Event::Finished(_) => None,
            })
            .collect()
    }

    pub fn was_started(&self, task: Name) -> bool {
        self.started().contains(&task)
    }

    /// Position of an event in the log.
    pub fn position(&self, event: Event) -> Option<usize> {
        self.events().iter().position(|e| *e == event)
    }

    /// `true` if `before` finished before `after` started.
    pub fn finished_before_started(&self, before: Name, after: Name) -> bool {
        match (
            self.position(Event::Finished(before)),
            self.position(Event::Started(after)),
        ) {
            (Some(f), Some(s)) => f < s,
            _ => false,
        }
    }

    /// Highest number of tasks observed executing at the same time.
    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

/// What the executor does for one task.
#[derive(Debug, Clone, Default)]
enum Outcome {
    #[default]
    Succeed,
    Fail,
    Error(String),
    Panic,
}

#[derive(Debug, Clone, Default)]
struct Plan {
    outcome: Outcome,
    delay: Option<Duration>,
}

/// A fake executor that:
/// - records start/finish of every task in a [`Recorder`]
/// - succeeds unless told otherwise for a given task
/// - can fail, error, panic, or sleep for chosen tasks.
#[derive(Debug, Clone)]
pub struct RecordingExecutor {
    recorder: Recorder,
    plans: HashMap<Name, Plan>,
}

impl RecordingExecutor {
    pub fn new(recorder: Recorder) -> Self {
        Self {
            recorder,
            plans: HashMap::new(),
        }
    }

    /// Resolve `false` for this task.
    pub fn failing(mut self, task: Name) -> Self {
        self.plans.entry(task).or_default().outcome = Outcome::Fail;
        self
    }

    /// Resolve `Err(message)` for this task.
    pub fn erroring(mut self, task: Name, message: &str) -> Self {
        self.plans.entry(task).or_default().outcome = Outcome::Error(message.to_string());
        self
    }

    /// Panic inside the executor future for this task.
    pub fn panicking(mut self, task: Name) -> Self {
        self.plans.entry(task).or_default().outcome = Outcome::Panic;
        self
    }

    /// Sleep before resolving this task.
    pub fn delayed(mut self, task: Name, delay: Duration) -> Self {
        self.plans.entry(task).or_default().delay = Some(delay);
        self
    }

    /// Sleep before resolving every task without an explicit delay.
    pub fn delayed_all(mut self, tasks: &[Name], delay: Duration) -> Self {
        for task in tasks {
            self.plans.entry(*task).or_default().delay.get_or_insert(delay);
        }
        self
    }
}

impl TaskExecutor<Name> for RecordingExecutor {
    fn perform(&self, task: Name) -> PerformFuture {
        let recorder = self.recorder.clone();
        let plan = self.plans.get(task).cloned().unwrap_or_default();

        Box::pin(async move {
            recorder.start(task);
            if let Some(delay) = plan.delay {
                tokio::time::sleep(delay).await;
            }
            let result = match plan.outcome {
                Outcome::Succeed => Ok(true),
                Outcome::Fail => Ok(false),
                Outcome::Error(message) => Err(anyhow!(message)),
                Outcome::Panic => panic!("task {task} exploded"),
            };
            recorder.finish(task);
            result
        })
    }
}
