//! Processing Module
//!
//! Pure transformations of incoming telemetry. Currently the health classifier,
//! which turns a `TelemetryReading` into a `HealthStatus`.

pub mod health_classifier;

pub use health_classifier::{classify, classify_with};
