//! Lead endpoints: prioritized list, creation, stage moves, inbound messages,
//! next-best action

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{json_rejection, AppState};
use crate::agents::{detect_intent, extract_preferences};
use crate::api::envelope::{ApiErrorResponse, ApiResponse};
use crate::lifecycle::{RejectReason, TransitionOutcome, TransitionRecord, TransitionSource};
use crate::scoring::sort_by_priority;
use crate::types::{now_ms, Lead, LeadPatch, NewLead};

#[derive(Debug, Deserialize)]
pub struct LeadQuery {
    pub tenant: Option<String>,
}

/// GET /api/v1/leads?tenant= - leads sorted by priority with their scores
pub async fn list_leads(State(state): State<AppState>, Query(query): Query<LeadQuery>) -> Response {
    let tenant = query
        .tenant
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| state.config.engine.tenant_id.clone());

    // Serve the board as-is if the store is down
    if let Err(e) = state.leads.refresh(&tenant).await {
        warn!(tenant = %tenant, error = %e, "Lead refresh failed, serving board");
    }

    let leads = state.leads.board().read().await.leads(Some(&tenant));
    let health = state.monitor.snapshot().await;
    let scored = sort_by_priority(state.orchestrator.scorer(), leads, &health, now_ms());
    ApiResponse::ok(scored)
}

/// POST /api/v1/leads - create a lead; a supplied SSN goes to the vault only
pub async fn create_lead(State(state): State<AppState>, body: Result<Json<NewLead>, JsonRejection>) -> Response {
    let Json(mut new_lead) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    if new_lead.tenant_id.trim().is_empty() {
        new_lead.tenant_id = state.config.engine.tenant_id.clone();
    }
    let ssn = new_lead.ssn.take().filter(|s| !s.trim().is_empty());

    let lead = match state.leads.store().create(new_lead).await {
        Ok(lead) => lead,
        Err(e) => return e.into(),
    };
    if let Some(ssn) = ssn {
        if let Err(e) = state.vault.seal(&lead.id, ssn).await {
            warn!(lead_id = %lead.id, error = %e, "Could not seal sensitive data");
        }
    }
    state.leads.apply_snapshot(vec![lead.clone()]).await;
    info!(lead_id = %lead.id, tenant = %lead.tenant_id, "Lead created");

    ApiResponse::created(lead)
}

/// GET /api/v1/leads/:id
pub async fn get_lead(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.find_lead(&id).await {
        Ok(Some(lead)) => ApiResponse::ok(lead),
        Ok(None) => ApiErrorResponse::not_found(format!("lead {id} not found")),
        Err(e) => e.into(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub source: TransitionSource,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(flatten)]
    pub outcome: TransitionOutcome,
    /// Lifecycle message for an applied move
    pub message: Option<String>,
    pub lead: Option<Lead>,
}

/// POST /api/v1/leads/:id/status - request a stage change
///
/// A rejected move is not an error: it returns 200 with `outcome: rejected`
/// and nothing changes. Only an unknown lead is a 404.
pub async fn update_lead_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };

    let outcome = state
        .leads
        .move_lead(&id, &request.status, request.source, request.reason.as_deref())
        .await;

    if let TransitionOutcome::Rejected {
        reason: RejectReason::UnknownLead(_),
    } = &outcome
    {
        return ApiErrorResponse::not_found(format!("lead {id} not found"));
    }

    let board = state.leads.board();
    let board = board.read().await;
    let message = outcome
        .is_applied()
        .then(|| board.history().filter(|r| r.lead_id == id).last().map(|r| r.message.clone()))
        .flatten();

    ApiResponse::ok(StatusResponse {
        outcome,
        message,
        lead: board.lead(&id).cloned(),
    })
}

/// GET /api/v1/leads/:id/history - applied stage changes, oldest first
pub async fn get_lead_history(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let board = state.leads.board();
    let board = board.read().await;
    let records: Vec<TransitionRecord> = board.history().filter(|r| r.lead_id == id).cloned().collect();
    ApiResponse::ok(records)
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub lead: Lead,
    /// Persona the message should be routed to
    pub routed_agent: &'static str,
}

/// POST /api/v1/leads/:id/messages - record an inbound customer message:
/// update customer memory and route by intent
pub async fn record_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<MessageRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    if request.message.trim().is_empty() {
        return ApiErrorResponse::bad_request("message is required");
    }

    let lead = match state.find_lead(&id).await {
        Ok(Some(lead)) => lead,
        Ok(None) => return ApiErrorResponse::not_found(format!("lead {id} not found")),
        Err(e) => return e.into(),
    };

    let patch = LeadPatch {
        customer_memory: Some(extract_preferences(&lead, &request.message)),
        engagement_events: Some(lead.engagement_events.saturating_add(1)),
        ..LeadPatch::default()
    };
    let updated = match state.leads.store().update(&id, patch).await {
        Ok(updated) => updated,
        Err(e) => return e.into(),
    };
    state.leads.apply_snapshot(vec![updated.clone()]).await;

    let agent = detect_intent(&request.message);
    info!(lead_id = %id, agent = agent.id, "Inbound message recorded");
    ApiResponse::ok(MessageResponse {
        lead: updated,
        routed_agent: agent.id,
    })
}

/// GET /api/v1/leads/:id/action - recommended next step
pub async fn get_lead_action(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let lead = match state.find_lead(&id).await {
        Ok(Some(lead)) => lead,
        Ok(None) => return ApiErrorResponse::not_found(format!("lead {id} not found")),
        Err(e) => return e.into(),
    };

    let health = match &lead.vehicle_id {
        Some(vehicle_id) => state.monitor.health(vehicle_id).await,
        None => None,
    };
    ApiResponse::ok(state.orchestrator.orchestrate(&lead, health.as_ref()).await)
}
