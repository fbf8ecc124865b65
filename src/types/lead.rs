//! Lead types: LeadStatus, LeadChannel, CustomerMemory, Lead

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Pipeline stages
// ============================================================================

/// Sales pipeline stage. `Sold` and `Lost` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    #[serde(alias = "negotiating")]
    Negotiation,
    Sold,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Negotiation,
        LeadStatus::Sold,
        LeadStatus::Lost,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, LeadStatus::Sold | LeadStatus::Lost)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Negotiation => "negotiation",
            LeadStatus::Sold => "sold",
            LeadStatus::Lost => "lost",
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a stage name outside the enumerated set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lead status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for LeadStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            // Legacy board columns used the gerund
            "negotiation" | "negotiating" => Ok(LeadStatus::Negotiation),
            "sold" => Ok(LeadStatus::Sold),
            "lost" => Ok(LeadStatus::Lost),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

// ============================================================================
// Acquisition channel
// ============================================================================

/// How the lead reached the dealership
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum LeadChannel {
    #[serde(rename = "whatsapp")]
    Whatsapp,
    #[serde(rename = "form")]
    Form,
    #[serde(rename = "trade-in")]
    TradeIn,
    #[serde(rename = "visual_ai")]
    VisualAi,
    #[serde(rename = "chat")]
    Chat,
    #[serde(rename = "finance")]
    Finance,
    #[default]
    #[serde(rename = "general", other)]
    General,
}

impl std::fmt::Display for LeadChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadChannel::Whatsapp => write!(f, "whatsapp"),
            LeadChannel::Form => write!(f, "form"),
            LeadChannel::TradeIn => write!(f, "trade-in"),
            LeadChannel::VisualAi => write!(f, "visual_ai"),
            LeadChannel::Chat => write!(f, "chat"),
            LeadChannel::Finance => write!(f, "finance"),
            LeadChannel::General => write!(f, "general"),
        }
    }
}

// ============================================================================
// Customer memory
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub budget_range: Option<String>,
}

/// What the dealership remembers about a customer across conversations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CustomerMemory {
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub objections: Vec<String>,
    #[serde(default)]
    pub lifestyle: Option<String>,
    #[serde(default)]
    pub last_interaction_summary: Option<String>,
    #[serde(default)]
    pub historical_context: Vec<String>,
}

// ============================================================================
// Lead
// ============================================================================

/// A sales prospect moving through the pipeline.
///
/// `status` changes only through `lifecycle`; `version` is bumped by the store on
/// every write and drives reconciliation of optimistic local edits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    #[serde(default)]
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "type", default)]
    pub channel: LeadChannel,
    #[serde(default)]
    pub status: LeadStatus,
    #[serde(default)]
    pub car_id: Option<String>,
    /// Telemetry-bearing vehicle owned by the customer
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub vehicle_of_interest: Option<String>,
    /// Never serialized; the vault is the only read path.
    #[serde(default, skip_serializing)]
    pub ssn: Option<String>,
    /// Baseline intent score (0-100) from upstream analysis
    #[serde(default)]
    pub ai_score: Option<f64>,
    #[serde(default)]
    pub identity_verified: bool,
    /// Visits, chats and replies recorded for this lead
    #[serde(default)]
    pub engagement_events: u32,
    /// Epoch ms
    #[serde(default)]
    pub created_at: i64,
    /// Epoch ms
    #[serde(default)]
    pub last_contacted: Option<i64>,
    #[serde(default)]
    pub customer_memory: Option<CustomerMemory>,
    #[serde(default)]
    pub version: u64,
}

/// Input for creating a lead; the store assigns id, status, timestamps and version.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    #[serde(default)]
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "type", default)]
    pub channel: LeadChannel,
    #[serde(default)]
    pub car_id: Option<String>,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub vehicle_of_interest: Option<String>,
    #[serde(default)]
    pub ssn: Option<String>,
    #[serde(default)]
    pub ai_score: Option<f64>,
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LeadPatch {
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub ai_score: Option<f64>,
    #[serde(default)]
    pub identity_verified: Option<bool>,
    #[serde(default)]
    pub engagement_events: Option<u32>,
    #[serde(default)]
    pub last_contacted: Option<i64>,
    #[serde(default)]
    pub customer_memory: Option<CustomerMemory>,
}

impl LeadPatch {
    pub fn status(status: LeadStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Apply to a lead in place. Does not touch `version`.
    pub fn apply_to(&self, lead: &mut Lead) {
        if let Some(status) = self.status {
            lead.status = status;
        }
        if let Some(score) = self.ai_score {
            lead.ai_score = Some(score);
        }
        if let Some(verified) = self.identity_verified {
            lead.identity_verified = verified;
        }
        if let Some(events) = self.engagement_events {
            lead.engagement_events = events;
        }
        if let Some(ts) = self.last_contacted {
            lead.last_contacted = Some(ts);
        }
        if let Some(memory) = &self.customer_memory {
            lead.customer_memory = Some(memory.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_statuses_and_legacy_alias() {
        assert_eq!("new".parse::<LeadStatus>(), Ok(LeadStatus::New));
        assert_eq!(" Sold ".parse::<LeadStatus>(), Ok(LeadStatus::Sold));
        assert_eq!("negotiating".parse::<LeadStatus>(), Ok(LeadStatus::Negotiation));
        assert!("archived".parse::<LeadStatus>().is_err());
    }

    #[test]
    fn ssn_is_never_serialized() {
        let lead = Lead {
            id: "l1".to_string(),
            name: "Ana".to_string(),
            ssn: Some("123-45-6789".to_string()),
            ..Lead::default()
        };
        let json = serde_json::to_string(&lead).unwrap();
        assert!(!json.contains("123-45-6789"));
        assert!(!json.contains("ssn"));
    }

    #[test]
    fn unknown_channel_falls_back_to_general() {
        let lead: Lead =
            serde_json::from_str(r#"{"id":"l1","name":"Ana","type":"billboard"}"#).unwrap();
        assert_eq!(lead.channel, LeadChannel::General);

        let lead: Lead =
            serde_json::from_str(r#"{"id":"l2","name":"Ana","type":"trade-in"}"#).unwrap();
        assert_eq!(lead.channel, LeadChannel::TradeIn);
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut lead = Lead {
            engagement_events: 3,
            ..Lead::default()
        };
        LeadPatch::status(LeadStatus::Contacted).apply_to(&mut lead);
        assert_eq!(lead.status, LeadStatus::Contacted);
        assert_eq!(lead.engagement_events, 3);
    }
}
