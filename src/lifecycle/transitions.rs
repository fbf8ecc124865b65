//! Lead stage transition table
//!
//! ```text
//! new ──► contacted ──► negotiation ──► sold
//!  │          │              │
//!  └──────────┴──────────────┴────────► lost
//! ```
//!
//! `sold` and `lost` are terminal. Requests for a stage outside the enumerated
//! set, for a skipped stage, or out of a terminal stage are rejected without
//! mutating anything.

use serde::{Deserialize, Serialize};

use crate::types::LeadStatus;

/// Who asked for the move
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransitionSource {
    /// Board drag-and-drop
    #[default]
    Manual,
    /// Rule or agent triggered
    Automated,
}

/// Why a transition was refused
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum RejectReason {
    /// Target is not one of the enumerated stages
    UnknownStage(String),
    /// Lead does not exist in the local view
    UnknownLead(String),
    /// Lead is already in the requested stage
    Unchanged,
    /// Current stage is terminal
    Terminal,
    /// Edge not in the transition table
    NotAllowed,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::UnknownStage(s) => write!(f, "unknown stage '{s}'"),
            RejectReason::UnknownLead(id) => write!(f, "unknown lead '{id}'"),
            RejectReason::Unchanged => write!(f, "lead already in requested stage"),
            RejectReason::Terminal => write!(f, "lead is in a terminal stage"),
            RejectReason::NotAllowed => write!(f, "transition not allowed"),
        }
    }
}

/// Result of a transition request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum TransitionOutcome {
    Applied { from: LeadStatus, to: LeadStatus },
    Rejected { reason: RejectReason },
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied { .. })
    }

    fn rejected(reason: RejectReason) -> Self {
        TransitionOutcome::Rejected { reason }
    }
}

/// Stages reachable in one step from `from`.
pub fn allowed_targets(from: LeadStatus) -> &'static [LeadStatus] {
    match from {
        LeadStatus::New => &[LeadStatus::Contacted, LeadStatus::Lost],
        LeadStatus::Contacted => &[LeadStatus::Negotiation, LeadStatus::Lost],
        LeadStatus::Negotiation => &[LeadStatus::Sold, LeadStatus::Lost],
        LeadStatus::Sold | LeadStatus::Lost => &[],
    }
}

pub fn can_transition(from: LeadStatus, to: LeadStatus) -> bool {
    allowed_targets(from).contains(&to)
}

/// Validate a move from `from` to the stage named `requested`.
pub fn validate(from: LeadStatus, requested: &str) -> TransitionOutcome {
    let to = match requested.parse::<LeadStatus>() {
        Ok(to) => to,
        Err(e) => return TransitionOutcome::rejected(RejectReason::UnknownStage(e.0)),
    };
    validate_status(from, to)
}

/// Validate a move between two known stages.
pub fn validate_status(from: LeadStatus, to: LeadStatus) -> TransitionOutcome {
    if from == to {
        TransitionOutcome::rejected(RejectReason::Unchanged)
    } else if from.is_terminal() {
        TransitionOutcome::rejected(RejectReason::Terminal)
    } else if !can_transition(from, to) {
        TransitionOutcome::rejected(RejectReason::NotAllowed)
    } else {
        TransitionOutcome::Applied { from, to }
    }
}

/// Human-readable summary of a lead entering a stage.
pub fn lifecycle_message(lead_name: &str, to: LeadStatus, reason: Option<&str>) -> String {
    match to {
        LeadStatus::New => format!("New lead {lead_name} received. Starting contact sequence."),
        LeadStatus::Contacted => format!("First contact made with {lead_name}."),
        LeadStatus::Negotiation => format!("{lead_name} moved to negotiation."),
        LeadStatus::Sold => format!("Sale closed for {lead_name}. Recording in CRM."),
        LeadStatus::Lost => format!(
            "Opportunity lost with {lead_name}. Reason: {}",
            reason.unwrap_or("unknown")
        ),
    }
}
