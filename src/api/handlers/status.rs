//! Liveness and engine counters

use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use super::AppState;
use crate::api::envelope::ApiResponse;
use crate::pipeline::MonitorStats;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub dealership: String,
    pub vehicles_tracked: usize,
    pub leads_on_board: usize,
    pub monitor: MonitorStats,
    pub actions_generated: u64,
    pub action_fallbacks: u64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Response {
    let (actions_generated, action_fallbacks) = state.orchestrator.stats();
    ApiResponse::ok(HealthCheck {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        dealership: state.config.engine.dealership.clone(),
        vehicles_tracked: state.monitor.health_map().read().await.len(),
        leads_on_board: state.leads.board().read().await.len(),
        monitor: state.monitor.stats(),
        actions_generated,
        action_fallbacks,
    })
}

/// GET /api/v1/config
pub async fn get_config(State(state): State<AppState>) -> Response {
    ApiResponse::ok(state.config.as_ref().clone())
}
