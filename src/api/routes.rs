//! API route definitions
//!
//! - /health - liveness and engine counters
//! - /api/v1/telemetry - reading ingest
//! - /api/v1/vehicles/:id/health - latest vehicle health
//! - /api/v1/leads - prioritized list and creation
//! - /api/v1/leads/:id/{status,history,messages,action,secure}

use axum::{routing::{get, post}, Router};

use super::handlers::{self, AppState};

/// Create all /api/v1 routes
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/config", get(handlers::get_config))
        // Telemetry
        .route("/telemetry", post(handlers::ingest_telemetry))
        .route("/vehicles/:id/health", get(handlers::get_vehicle_health))
        // Leads
        .route("/leads", get(handlers::list_leads).post(handlers::create_lead))
        .route("/leads/:id", get(handlers::get_lead))
        .route("/leads/:id/status", post(handlers::update_lead_status))
        .route("/leads/:id/history", get(handlers::get_lead_history))
        .route("/leads/:id/messages", post(handlers::record_message))
        .route("/leads/:id/action", get(handlers::get_lead_action))
        .route("/leads/:id/secure", get(handlers::get_secure_data))
        .with_state(state)
}

/// Health endpoint at root level
pub fn root_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state)
}
