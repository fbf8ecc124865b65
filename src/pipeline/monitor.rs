//! Telemetry Monitor
//!
//! Ingest → classify → {health map, notification dispatcher}. The health map
//! holds the latest `HealthStatus` per vehicle and is what scoring and
//! orchestration read. A reading older than the one already observed for the
//! same vehicle is ignored, so push and polling deliveries of the same sample
//! are processed once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::HealthThresholds;
use crate::notify::NotificationDispatcher;
use crate::processing::classify_with;
use crate::storage::{StoreError, TelemetryStore};
use crate::sync::subscribe_telemetry;
use crate::types::{now_ms, HealthState, HealthStatus, TelemetryReading};

/// Latest health per vehicle id
pub type HealthMap = Arc<RwLock<HashMap<String, HealthStatus>>>;

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct MonitorStats {
    pub readings_processed: u64,
    pub stale_readings: u64,
    pub notifications_sent: u64,
}

pub struct TelemetryMonitor {
    store: Arc<dyn TelemetryStore>,
    thresholds: HealthThresholds,
    dispatcher: Arc<NotificationDispatcher>,
    health: HealthMap,
    processed: AtomicU64,
    stale: AtomicU64,
    notified: AtomicU64,
}

impl TelemetryMonitor {
    pub fn new(
        store: Arc<dyn TelemetryStore>,
        thresholds: HealthThresholds,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            thresholds,
            dispatcher,
            health: Arc::default(),
            processed: AtomicU64::new(0),
            stale: AtomicU64::new(0),
            notified: AtomicU64::new(0),
        }
    }

    pub fn health_map(&self) -> HealthMap {
        Arc::clone(&self.health)
    }

    pub fn store(&self) -> Arc<dyn TelemetryStore> {
        Arc::clone(&self.store)
    }

    pub async fn health(&self, vehicle_id: &str) -> Option<HealthStatus> {
        self.health.read().await.get(vehicle_id).cloned()
    }

    pub async fn snapshot(&self) -> HashMap<String, HealthStatus> {
        self.health.read().await.clone()
    }

    pub fn stats(&self) -> MonitorStats {
        MonitorStats {
            readings_processed: self.processed.load(Ordering::Relaxed),
            stale_readings: self.stale.load(Ordering::Relaxed),
            notifications_sent: self.notified.load(Ordering::Relaxed),
        }
    }

    /// Persist a reading and process it. A reading without a timestamp is
    /// stamped with the current time.
    pub async fn ingest(&self, mut reading: TelemetryReading) -> Result<HealthStatus, StoreError> {
        if reading.vehicle_id.trim().is_empty() {
            return Err(StoreError::Invalid("vehicleId is required".to_string()));
        }
        if reading.last_update <= 0 {
            reading.last_update = now_ms();
        }
        self.store.write(reading.clone()).await?;
        Ok(self.observe(&reading).await)
    }

    /// Classify a reading without recording it or notifying.
    pub fn classify(&self, reading: &TelemetryReading) -> HealthStatus {
        classify_with(reading, &self.thresholds)
    }

    /// Classify a reading, record it and hand it to the dispatcher.
    ///
    /// Returns the vehicle's current health, which is the stored one when the
    /// reading is older than what was already observed. The dispatcher decides
    /// while the health map is held, so decisions for a vehicle follow reading
    /// order; delivery itself runs in the background.
    pub async fn observe(&self, reading: &TelemetryReading) -> HealthStatus {
        let status = self.classify(reading);

        let queued = {
            let mut health = self.health.write().await;
            if let Some(current) = health.get(&reading.vehicle_id) {
                if current.last_check > reading.last_update {
                    self.stale.fetch_add(1, Ordering::Relaxed);
                    debug!(vehicle_id = %reading.vehicle_id, "Ignoring superseded reading");
                    return current.clone();
                }
                if current.last_check == reading.last_update && *current == status {
                    return status;
                }
            }
            health.insert(reading.vehicle_id.clone(), status.clone());
            self.dispatcher.dispatch(&reading.vehicle_id, &status)
        };
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.notified.fetch_add(queued as u64, Ordering::Relaxed);

        if status.overall_status != HealthState::Healthy {
            debug!(
                vehicle_id = %reading.vehicle_id,
                status = ?status.overall_status,
                alerts = status.alerts.len(),
                "Vehicle health degraded"
            );
        }
        status
    }

    /// Wait for queued notifications to reach their sinks.
    pub async fn flush_notifications(&self) {
        self.dispatcher.drain().await;
    }

    /// Follow the telemetry store until cancelled: push when available,
    /// polling at `poll_interval` otherwise.
    pub async fn run(self: Arc<Self>, poll_interval: Duration, cancel_token: CancellationToken) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<TelemetryReading>>();
        let subscription = subscribe_telemetry(self.store(), poll_interval, move |readings| {
            if tx.send(readings).is_err() {
                warn!("Telemetry monitor channel closed");
            }
        });
        info!(backend = self.store.backend_name(), "Telemetry monitor started");

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Telemetry monitor received shutdown signal");
                    break;
                }
                batch = rx.recv() => {
                    let Some(readings) = batch else { break };
                    for reading in &readings {
                        self.observe(reading).await;
                    }
                }
            }
        }

        subscription.shutdown().await;
        self.flush_notifications().await;
        let stats = self.stats();
        info!(
            processed = stats.readings_processed,
            notifications = stats.notifications_sent,
            "Telemetry monitor stopped"
        );
    }
}
