// src/config/mod.rs

//! Configuration loading and validation for dagrun.
//!
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate what `serde` can't (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{RawConfigFile, RunnerConfig, RunnerSection};
pub use validate::validate_raw_config;
