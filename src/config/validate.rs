// src/config/validate.rs

use std::num::NonZeroUsize;

use crate::config::model::{RawConfigFile, RunnerConfig};
use crate::errors::{DagrunError, Result};

impl TryFrom<RawConfigFile> for RunnerConfig {
    type Error = DagrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        Ok(RunnerConfig {
            max_concurrency: raw.runner.max_concurrency.and_then(NonZeroUsize::new),
            fault_policy: raw.runner.executor_faults,
        })
    }
}

/// Semantic checks that `serde` cannot express.
pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    // executor_faults is strongly typed and validated during
    // deserialization, so only the numeric bound needs checking here.
    if cfg.runner.max_concurrency == Some(0) {
        return Err(DagrunError::ConfigError(
            "[runner].max_concurrency must be >= 1 (got 0); omit it for unbounded".to_string(),
        ));
    }

    Ok(())
}
