//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! the /health and /api/v1/* endpoints using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use lead_engine::api::{create_app, AppState};
use lead_engine::config::EngineConfig;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

fn create_test_state() -> AppState {
    AppState::in_memory(EngineConfig::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_lead(app: &Router, body: Value) -> String {
    let (status, json) = send(app, post_json("/api/v1/leads", body)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_returns_envelope() {
    let app = create_app(create_test_state());
    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["dealership"], "Richard Automotive");
    assert_eq!(json["meta"]["version"], "1");
}

#[tokio::test]
async fn test_config_endpoint_returns_sections() {
    let app = create_app(create_test_state());
    let (status, json) = send(&app, get("/api/v1/config")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["thresholds"]["temp_critical_c"], 105.0);
}

#[tokio::test]
async fn test_ingest_then_read_vehicle_health() {
    let app = create_app(create_test_state());
    let reading = json!({
        "vehicleId": "veh-1",
        "speed": 60.0,
        "rpm": 800.0,
        "fuelLevel": 50.0,
        "temp": 110.0,
        "batteryVoltage": 12.4,
        "lastUpdate": 1_700_000_000_000_i64
    });

    let (status, json) = send(&app, post_json("/api/v1/telemetry", reading)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["overallStatus"], "critical");
    assert_eq!(json["data"]["alerts"].as_array().unwrap().len(), 1);

    let (status, json) = send(&app, get("/api/v1/vehicles/veh-1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["overallStatus"], "critical");
    assert_eq!(json["data"]["alerts"][0]["category"], "engine");
}

#[tokio::test]
async fn test_partial_reading_is_accepted() {
    let app = create_app(create_test_state());
    let (status, json) = send(
        &app,
        post_json("/api/v1/telemetry", json!({"vehicleId": "veh-2", "fuelLevel": 5.0})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["overallStatus"], "critical");
    assert_eq!(json["data"]["alerts"][0]["category"], "fuel");
}

#[tokio::test]
async fn test_malformed_telemetry_is_bad_request() {
    let app = create_app(create_test_state());
    let (status, json) = send(&app, post_json("/api/v1/telemetry", json!({"speed": "fast"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_vehicle_is_not_found() {
    let app = create_app(create_test_state());
    let (status, json) = send(&app, get("/api/v1/vehicles/ghost/health")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_created_lead_hides_ssn_and_appears_in_list() {
    let app = create_app(create_test_state());
    let (status, json) = send(
        &app,
        post_json(
            "/api/v1/leads",
            json!({"name": "Ana Pérez", "tenantId": "richard", "ssn": "123-45-6789", "type": "finance"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["status"], "new");
    assert!(json["data"].get("ssn").is_none());

    let (status, json) = send(&app, get("/api/v1/leads?tenant=richard")).await;
    assert_eq!(status, StatusCode::OK);
    let leads = json["data"].as_array().unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0]["lead"]["name"], "Ana Pérez");
    assert!(leads[0]["scoring"]["score"].as_f64().is_some());
}

#[tokio::test]
async fn test_leads_are_sorted_by_priority() {
    let app = create_app(create_test_state());
    create_lead(&app, json!({"name": "Low", "tenantId": "t1", "aiScore": 10.0})).await;
    create_lead(&app, json!({"name": "High", "tenantId": "t1", "aiScore": 95.0})).await;

    let (_, json) = send(&app, get("/api/v1/leads?tenant=t1")).await;
    let leads = json["data"].as_array().unwrap();
    assert_eq!(leads[0]["lead"]["name"], "High");
    assert_eq!(leads[1]["lead"]["name"], "Low");
}

#[tokio::test]
async fn test_status_transitions_follow_pipeline() {
    let app = create_app(create_test_state());
    let id = create_lead(&app, json!({"name": "Luis", "tenantId": "t1"})).await;
    let uri = format!("/api/v1/leads/{id}/status");

    // Skipping a stage is a no-op
    let (status, json) = send(&app, post_json(&uri, json!({"status": "negotiation"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["outcome"], "rejected");
    assert_eq!(json["data"]["lead"]["status"], "new");

    for stage in ["contacted", "negotiation", "sold"] {
        let (status, json) = send(&app, post_json(&uri, json!({"status": stage}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["outcome"], "applied", "move to {stage}");
        assert_eq!(json["data"]["to"], stage);
    }

    let (_, json) = send(&app, post_json(&uri, json!({"status": "contacted"}))).await;
    assert_eq!(json["data"]["outcome"], "rejected");
    assert_eq!(json["data"]["lead"]["status"], "sold");

    let (_, json) = send(&app, get(&format!("/api/v1/leads/{id}/history"))).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_sold_move_carries_lifecycle_message() {
    let app = create_app(create_test_state());
    let id = create_lead(&app, json!({"name": "Marta", "tenantId": "t1"})).await;
    let uri = format!("/api/v1/leads/{id}/status");

    send(&app, post_json(&uri, json!({"status": "contacted"}))).await;
    send(&app, post_json(&uri, json!({"status": "negotiation"}))).await;
    let (_, json) = send(&app, post_json(&uri, json!({"status": "sold"}))).await;

    assert!(json["data"]["message"].as_str().unwrap().contains("Marta"));
}

#[tokio::test]
async fn test_unknown_stage_is_rejected_not_error() {
    let app = create_app(create_test_state());
    let id = create_lead(&app, json!({"name": "Pablo", "tenantId": "t1"})).await;
    let (status, json) = send(
        &app,
        post_json(&format!("/api/v1/leads/{id}/status"), json!({"status": "archived"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["outcome"], "rejected");
}

#[tokio::test]
async fn test_status_for_unknown_lead_is_not_found() {
    let app = create_app(create_test_state());
    let (status, _) = send(
        &app,
        post_json("/api/v1/leads/nope/status", json!({"status": "contacted"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_action_for_lead_with_critical_vehicle_is_urgent() {
    let app = create_app(create_test_state());
    send(
        &app,
        post_json(
            "/api/v1/telemetry",
            json!({"vehicleId": "veh-9", "temp": 112.0, "lastUpdate": 5}),
        ),
    )
    .await;
    let id = create_lead(
        &app,
        json!({"name": "Rosa", "tenantId": "t1", "vehicleId": "veh-9", "aiScore": 40.0}),
    )
    .await;

    let (status, json) = send(&app, get(&format!("/api/v1/leads/{id}/action"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["priority"], "urgent");
    assert_eq!(json["data"]["agentId"], "mateo");
    assert!(json["data"]["message"].as_str().unwrap().contains("Rosa"));
}

#[tokio::test]
async fn test_inbound_message_updates_memory_and_routes() {
    let app = create_app(create_test_state());
    let id = create_lead(&app, json!({"name": "Eva", "tenantId": "t1"})).await;

    let (status, json) = send(
        &app,
        post_json(
            &format!("/api/v1/leads/{id}/messages"),
            json!({"message": "Quiero saber el financiamiento para una Tucson roja"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["routedAgent"], "sofia");
    let models = json["data"]["lead"]["customerMemory"]["preferences"]["models"]
        .as_array()
        .unwrap();
    assert!(models.iter().any(|m| m == "tucson"));
    assert_eq!(json["data"]["lead"]["engagementEvents"], 1);
}

#[tokio::test]
async fn test_secure_data_requires_admin() {
    let app = create_app(create_test_state());
    let id = create_lead(
        &app,
        json!({"name": "Iván", "tenantId": "t1", "ssn": "987-65-4321"}),
    )
    .await;
    let uri = format!("/api/v1/leads/{id}/secure");

    let (status, json) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"]["code"], "PERMISSION_DENIED");

    let request = Request::builder()
        .uri(&uri)
        .header("x-role", "agent")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = Request::builder()
        .uri(&uri)
        .header("x-role", "admin")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["ssn"], "987-65-4321");
}

#[tokio::test]
async fn test_secure_data_absent_is_not_found_for_admin() {
    let app = create_app(create_test_state());
    let id = create_lead(&app, json!({"name": "Noel", "tenantId": "t1"})).await;

    let request = Request::builder()
        .uri(format!("/api/v1/leads/{id}/secure"))
        .header("x-role", "super_admin")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
