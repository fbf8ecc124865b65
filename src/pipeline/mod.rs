//! Processing Pipeline
//!
//! ```text
//! TelemetryStore ──(push | poll)──> TelemetryMonitor ──> classify ──┬─> health map
//!                                                                   └─> NotificationDispatcher
//! LeadStore ──(poll)──> lead sync ──> LeadBoard reconcile
//! ```
//!
//! Scoring and orchestration read the health map and the board on demand; they
//! are not part of the streaming path.

mod lead_sync;
mod monitor;

pub use lead_sync::run_lead_sync;
pub use monitor::{HealthMap, MonitorStats, TelemetryMonitor};
