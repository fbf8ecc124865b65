//! Scoring and orchestration output types

use serde::{Deserialize, Serialize};

/// Response-urgency tier for a lead
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
    Urgent,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Normal => write!(f, "NORMAL"),
            Priority::High => write!(f, "HIGH"),
            Priority::Urgent => write!(f, "URGENT"),
        }
    }
}

/// Output of lead scoring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringResult {
    /// Clamped to 0-100
    pub score: f64,
    pub priority: Priority,
    /// Human-readable contributions, e.g. "Critical vehicle health (+35)"
    pub factors: Vec<String>,
}

/// Where the draft message of an action came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageSource {
    Generated,
    Fallback,
}

/// The single recommended next step for a lead. Derived on demand, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationAction {
    pub lead_id: String,
    pub agent_id: String,
    pub priority: Priority,
    pub score: f64,
    pub suggested_action: String,
    pub reasoning: String,
    pub message: String,
    pub message_source: MessageSource,
}
