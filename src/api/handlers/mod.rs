//! API route handlers
//!
//! - `status`: liveness and engine counters
//! - `telemetry`: reading ingest and per-vehicle health
//! - `leads`: prioritized lead list, creation, stage moves, next-best action
//! - `secure`: vault-gated sensitive fields

mod leads;
mod secure;
mod status;
mod telemetry;

pub use leads::*;
pub use secure::*;
pub use status::*;
pub use telemetry::*;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::response::Response;
use tracing::warn;

use super::envelope::ApiErrorResponse;
use crate::agents::Orchestrator;
use crate::config::EngineConfig;
use crate::lifecycle::LeadPipeline;
use crate::llm::{TemplateDrafter, TextGenerator};
use crate::notify::NotificationDispatcher;
use crate::pipeline::TelemetryMonitor;
use crate::storage::{
    InMemoryLeadStore, InMemoryTelemetryStore, InMemoryVault, LeadStore, SecureVault, StoreError,
    TelemetryStore,
};
use crate::types::Lead;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EngineConfig>,
    pub monitor: Arc<TelemetryMonitor>,
    pub leads: Arc<LeadPipeline>,
    pub vault: Arc<dyn SecureVault>,
    pub orchestrator: Arc<Orchestrator>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: EngineConfig,
        telemetry: Arc<dyn TelemetryStore>,
        leads: Arc<dyn LeadStore>,
        vault: Arc<dyn SecureVault>,
        generator: Arc<dyn TextGenerator>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        let monitor = TelemetryMonitor::new(telemetry, config.thresholds.clone(), dispatcher);
        let orchestrator = Orchestrator::from_config(&config, generator);
        Self {
            config: Arc::new(config),
            monitor: Arc::new(monitor),
            leads: Arc::new(LeadPipeline::new(leads)),
            vault,
            orchestrator: Arc::new(orchestrator),
            started_at: Instant::now(),
        }
    }

    /// In-memory stores, template drafts and log-only notifications.
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryTelemetryStore::new()),
            Arc::new(InMemoryLeadStore::new()),
            Arc::new(InMemoryVault::new()),
            Arc::new(TemplateDrafter),
            Arc::new(NotificationDispatcher::logging()),
        )
    }

    /// A lead from the board, loading it from the store when the board has
    /// not seen it yet.
    pub async fn find_lead(&self, id: &str) -> Result<Option<Lead>, StoreError> {
        if let Some(lead) = self.leads.board().read().await.lead(id) {
            return Ok(Some(lead.clone()));
        }
        let Some(lead) = self.leads.store().get(id).await? else {
            return Ok(None);
        };
        self.leads.apply_snapshot(vec![lead.clone()]).await;
        Ok(Some(lead))
    }
}

/// Turn a JSON body rejection into the error envelope.
pub(crate) fn json_rejection(rejection: JsonRejection) -> Response {
    warn!(error = %rejection, "Rejected request body");
    ApiErrorResponse::bad_request(rejection.body_text())
}
