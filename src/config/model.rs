// src/config/model.rs

use std::num::NonZeroUsize;

use serde::Deserialize;

use crate::types::FaultPolicy;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [runner]
/// max_concurrency = 8
/// executor_faults = "report"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Scheduling behaviour from `[runner]`.
    #[serde(default)]
    pub runner: RunnerSection,
}

/// `[runner]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunnerSection {
    /// Upper bound on concurrently live units of work (and therefore on
    /// concurrently executing tasks).
    ///
    /// Omitted means unbounded: one unit per ready task. `0` is rejected.
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// `"report"` (default) or `"ignore"`; see [`FaultPolicy`].
    #[serde(default)]
    pub executor_faults: FaultPolicy,
}

/// Validated runner configuration.
///
/// Build it in code with the `with_*` methods, or load it from TOML via
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunnerConfig {
    pub max_concurrency: Option<NonZeroUsize>,
    pub fault_policy: FaultPolicy,
}

impl RunnerConfig {
    pub fn with_max_concurrency(mut self, limit: NonZeroUsize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    /// Number of units of work allowed to be alive at once.
    pub fn unit_limit(&self) -> usize {
        self.max_concurrency.map_or(usize::MAX, NonZeroUsize::get)
    }
}
