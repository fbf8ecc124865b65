//! Engine Configuration Module
//!
//! Per-deployment configuration loaded from TOML, covering health thresholds,
//! the lead scoring weight table, orchestration timeouts, sync intervals and
//! notification delivery.
//!
//! ## Loading Order
//!
//! 1. `LEAD_ENGINE_CONFIG` environment variable (path to TOML file)
//! 2. `engine_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Components receive the section they need explicitly (`&HealthThresholds`,
//! `ScoringWeights`, ...) rather than reading a process-wide global.

mod engine_config;
pub mod defaults;
pub mod validation;

pub use engine_config::*;
