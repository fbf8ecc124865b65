//! Draft Text Generation
//!
//! The orchestration service asks a `TextGenerator` to turn a rendered strategy
//! template plus lead and vehicle context into the outbound message. Generators
//! may be slow or fail; the caller bounds them with a timeout and falls back to
//! a generic message.
//!
//! ## Backends
//!
//! - **TemplateDrafter**: returns the rendered template unchanged. Deterministic.
//! - **HttpDrafter**: posts the context to a remote generation endpoint.

mod remote;
mod template;

pub use remote::HttpDrafter;
pub use template::TemplateDrafter;

use async_trait::async_trait;
use serde::Serialize;

use crate::types::{HealthState, Priority};

/// Generation errors
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generation endpoint returned status {0}")]
    ServerError(reqwest::StatusCode),
    #[error("generator returned an empty draft")]
    Empty,
    #[error("generation timed out after {0} ms")]
    Timeout(u64),
}

/// Everything a generator may use to write the message.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftContext {
    pub lead_id: String,
    pub lead_name: String,
    pub agent_id: String,
    pub agent_name: String,
    pub agent_style: String,
    pub dealership: String,
    pub priority: Priority,
    pub health: Option<HealthState>,
    /// Alert messages joined, empty when healthy or unknown
    pub alert_summary: String,
    pub suggested_action: String,
    /// Strategy template already rendered with this context
    pub template_draft: String,
}

/// Unified trait for draft generators
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce the outbound message for a lead
    async fn generate(&self, context: &DraftContext) -> Result<String, GenerationError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}
