#![allow(dead_code)]

use std::error::Error;

use dagrun::{DependencyMap, Runner};
use dagrun_test_utils::recording_executor::{Name, Recorder, RecordingExecutor};

pub type TestResult = Result<(), Box<dyn Error>>;

pub type TestRunner = Runner<Name, DependencyMap<Name>, RecordingExecutor>;

/// Runner over a dependency table whose executor records into a fresh
/// [`Recorder`].
pub fn recording_runner(deps: DependencyMap<Name>) -> (TestRunner, Recorder) {
    let recorder = Recorder::new();
    let runner = Runner::new(deps, RecordingExecutor::new(recorder.clone()));
    (runner, recorder)
}
