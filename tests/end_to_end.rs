//! End-to-End Flow Tests
//!
//! Telemetry → health → notification → lead scoring → next action, plus the
//! lead lifecycle against an in-memory store. Library level, no HTTP.

use std::sync::Arc;

use lead_engine::config::EngineConfig;
use lead_engine::lifecycle::TransitionSource;
use lead_engine::llm::TemplateDrafter;
use lead_engine::notify::{MemorySink, NotificationSink};
use lead_engine::storage::{InMemoryLeadStore, InMemoryTelemetryStore, LeadStore};
use lead_engine::types::{
    AlertCategory, GeoPoint, HealthState, LeadStatus, MessageSource, NewLead, Priority,
    TelemetryReading,
};
use lead_engine::{
    classify, LeadPipeline, NotificationDispatcher, Orchestrator, TelemetryMonitor,
    TransitionOutcome,
};

const T0: i64 = 1_700_000_000_000;

fn reading(id: &str, temp: f64, battery: f64, fuel: f64, rpm: f64, speed: f64, ts: i64) -> TelemetryReading {
    TelemetryReading::new(
        id,
        speed,
        rpm,
        fuel,
        temp,
        battery,
        GeoPoint { lat: 19.4326, lng: -99.1332 },
        ts,
    )
}

fn monitor_with_sink() -> (TelemetryMonitor, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let sinks: Vec<Arc<dyn NotificationSink>> = vec![sink.clone()];
    let monitor = TelemetryMonitor::new(
        Arc::new(InMemoryTelemetryStore::new()),
        EngineConfig::default().thresholds,
        Arc::new(NotificationDispatcher::new(sinks)),
    );
    (monitor, sink)
}

fn orchestrator() -> Orchestrator {
    Orchestrator::from_config(&EngineConfig::default(), Arc::new(TemplateDrafter))
}

#[tokio::test]
async fn overheating_vehicle_escalates_its_lead_to_urgent() {
    let (monitor, sink) = monitor_with_sink();

    let health = monitor
        .ingest(reading("veh-1", 110.0, 12.4, 50.0, 800.0, 60.0, T0))
        .await
        .unwrap();

    assert_eq!(health.overall_status, HealthState::Critical);
    assert_eq!(health.alerts.len(), 1);
    assert_eq!(health.alerts[0].category, AlertCategory::Engine);
    monitor.flush_notifications().await;
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.sent()[0].title, "CRITICAL ALERT: ENGINE");

    let store = InMemoryLeadStore::new();
    let mut lead = store
        .create(NewLead {
            tenant_id: "richard".into(),
            name: "Rosa Díaz".into(),
            vehicle_id: Some("veh-1".into()),
            ai_score: Some(40.0),
            ..NewLead::default()
        })
        .await
        .unwrap();
    // Past the new-lead bonus, contacted today
    lead.status = LeadStatus::Contacted;
    lead.last_contacted = Some(T0);

    let action = orchestrator().orchestrate_at(&lead, Some(&health), T0).await;
    assert_eq!(action.priority, Priority::Urgent);
    assert_eq!(action.score, 75.0);
    assert_eq!(action.agent_id, "mateo");
    assert_eq!(action.message_source, MessageSource::Generated);
    assert!(action.message.contains("Rosa"));
}

#[tokio::test]
async fn healthy_vehicle_raises_nothing() {
    let (monitor, sink) = monitor_with_sink();

    let health = monitor
        .ingest(reading("veh-2", 90.0, 12.6, 80.0, 900.0, 30.0, T0))
        .await
        .unwrap();

    assert_eq!(health.overall_status, HealthState::Healthy);
    assert!(health.alerts.is_empty());
    monitor.flush_notifications().await;
    assert!(sink.is_empty());
}

#[tokio::test]
async fn persisting_fault_notifies_once_and_recurrence_notifies_again() {
    let (monitor, sink) = monitor_with_sink();

    for i in 0..5 {
        monitor
            .observe(&reading("veh-3", 111.0, 12.6, 60.0, 900.0, 40.0, T0 + i * 1000))
            .await;
    }
    monitor.flush_notifications().await;
    assert_eq!(sink.len(), 1);

    monitor
        .observe(&reading("veh-3", 90.0, 12.6, 60.0, 900.0, 40.0, T0 + 10_000))
        .await;
    monitor
        .observe(&reading("veh-3", 112.0, 12.6, 60.0, 900.0, 40.0, T0 + 20_000))
        .await;
    monitor.flush_notifications().await;
    assert_eq!(sink.len(), 2);
}

#[tokio::test]
async fn classification_is_idempotent() {
    let r = reading("veh-4", 99.0, 11.8, 12.0, 5000.0, 80.0, T0);
    let first = classify(&r);
    let second = classify(&r);

    assert_eq!(first, second);
    assert_eq!(first.overall_status, HealthState::Warning);
    assert_eq!(first.last_check, T0);
}

#[tokio::test]
async fn lead_walks_the_sales_pipeline() {
    let store: Arc<dyn LeadStore> = Arc::new(InMemoryLeadStore::new());
    let lead = store
        .create(NewLead {
            tenant_id: "richard".into(),
            name: "Luis Ortega".into(),
            ..NewLead::default()
        })
        .await
        .unwrap();
    let pipeline = LeadPipeline::new(Arc::clone(&store));
    pipeline.refresh("richard").await.unwrap();

    let skip = pipeline
        .move_lead(&lead.id, "negotiation", TransitionSource::Manual, None)
        .await;
    assert!(!skip.is_applied());

    for stage in ["contacted", "negotiation", "sold"] {
        let outcome = pipeline
            .move_lead(&lead.id, stage, TransitionSource::Manual, None)
            .await;
        assert!(outcome.is_applied(), "move to {stage}: {outcome:?}");
    }

    let stored = store.get(&lead.id).await.unwrap().unwrap();
    assert_eq!(stored.status, LeadStatus::Sold);

    let reopen = pipeline
        .move_lead(&lead.id, "contacted", TransitionSource::Automated, None)
        .await;
    assert!(matches!(reopen, TransitionOutcome::Rejected { .. }));

    let board = pipeline.board();
    let board = board.read().await;
    assert_eq!(board.lead(&lead.id).map(|l| l.status), Some(LeadStatus::Sold));
    assert_eq!(board.history().count(), 3);
}

#[tokio::test]
async fn lost_is_reachable_from_any_open_stage() {
    let store: Arc<dyn LeadStore> = Arc::new(InMemoryLeadStore::new());
    let lead = store
        .create(NewLead {
            tenant_id: "richard".into(),
            name: "Pablo".into(),
            ..NewLead::default()
        })
        .await
        .unwrap();
    let pipeline = LeadPipeline::new(Arc::clone(&store));

    let outcome = pipeline
        .move_lead(&lead.id, "lost", TransitionSource::Manual, Some("bought elsewhere"))
        .await;
    assert!(outcome.is_applied());
    assert_eq!(
        store.get(&lead.id).await.unwrap().map(|l| l.status),
        Some(LeadStatus::Lost)
    );
}
