//! Shared helpers for dagrun's integration tests.
//!
//! - [`builders`] turns `(&str, &[&str])` tables into dependency lookups.
//! - [`recording_executor`] is an executor that logs what ran and when, and
//!   can be told to fail, fault, panic or stall on chosen tasks.

pub mod builders;
pub mod recording_executor;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Upper bound for a single scheduler run under test.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a per-test tracing subscriber once per test binary.
///
/// Output goes through the test writer, so it only shows up for failing
/// tests (or with `--nocapture`). `RUST_LOG=dagrun=debug` shows every claim
/// and completion; the default is `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await a run, failing the test after [`RUN_TIMEOUT`].
///
/// A scheduler bug rarely errors; it hangs. A unit that exits too early or
/// a lost fan-out request leaves `run_all` waiting on work nobody will
/// claim, and a barrier test that does not get real concurrency never
/// releases. This turns those hangs into a test failure.
pub async fn with_timeout<F, T>(run: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(RUN_TIMEOUT, run).await {
        Ok(out) => out,
        Err(_) => panic!("run did not quiesce within {RUN_TIMEOUT:?}; scheduler hang?"),
    }
}
