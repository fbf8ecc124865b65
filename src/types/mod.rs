//! Shared data structures for the vehicle health and lead orchestration engine
//!
//! - TelemetryReading: raw per-vehicle sample (ingest)
//! - HealthStatus / Alert: classifier output
//! - Lead and its pipeline stages
//! - ScoringResult / OrchestrationAction: derived read-models

mod action;
mod health;
mod lead;
mod telemetry;

pub use action::*;
pub use health::*;
pub use lead::*;
pub use telemetry::*;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
