//! Lead Engine: Vehicle Health & Lead Orchestration
//!
//! Streams vehicle telemetry into health classifications, scores dealership
//! leads against that health, and recommends one next action per lead.
//!
//! ## Architecture
//!
//! - **Processing**: pure telemetry → health classifier
//! - **Scoring**: lead + health → score and priority tier
//! - **Lifecycle**: sales-stage state machine with an optimistic board
//! - **Agents**: persona assignment, strategy templates, orchestration
//! - **Notify**: once-per-alert critical notifications
//! - **Sync / Pipeline**: store subscriptions feeding the monitor and the board
//! - **API**: axum HTTP surface

pub mod acquisition;
pub mod agents;
pub mod api;
pub mod config;
pub mod lifecycle;
pub mod llm;
pub mod notify;
pub mod pipeline;
pub mod processing;
pub mod scoring;
pub mod storage;
pub mod sync;
pub mod types;

pub use config::EngineConfig;

pub use types::{
    Alert, AlertCategory, AlertType, HealthState, HealthStatus, Lead, LeadStatus,
    OrchestrationAction, Priority, ScoringResult, TelemetryReading,
};

pub use agents::Orchestrator;
pub use lifecycle::{LeadPipeline, TransitionOutcome};
pub use notify::NotificationDispatcher;
pub use pipeline::TelemetryMonitor;
pub use processing::classify;
pub use scoring::LeadScorer;
