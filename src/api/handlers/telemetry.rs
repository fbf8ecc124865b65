//! Telemetry ingest and vehicle health endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use tracing::debug;

use super::{json_rejection, AppState};
use crate::api::envelope::{ApiErrorResponse, ApiResponse};
use crate::types::TelemetryReading;

/// POST /api/v1/telemetry - store a reading and return its health status
pub async fn ingest_telemetry(
    State(state): State<AppState>,
    body: Result<Json<TelemetryReading>, JsonRejection>,
) -> Response {
    let Json(reading) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    debug!(vehicle_id = %reading.vehicle_id, "Telemetry received");

    match state.monitor.ingest(reading).await {
        Ok(status) => ApiResponse::ok(status),
        Err(e) => e.into(),
    }
}

/// GET /api/v1/vehicles/:id/health - latest health, classifying the stored
/// reading if the monitor has not seen the vehicle yet. Read-only: never
/// records health or notifies.
pub async fn get_vehicle_health(State(state): State<AppState>, Path(vehicle_id): Path<String>) -> Response {
    if let Some(status) = state.monitor.health(&vehicle_id).await {
        return ApiResponse::ok(status);
    }

    match state.monitor.store().latest(&vehicle_id).await {
        Ok(Some(reading)) => ApiResponse::ok(state.monitor.classify(&reading)),
        Ok(None) => ApiErrorResponse::not_found(format!("no telemetry for vehicle {vehicle_id}")),
        Err(e) => e.into(),
    }
}
