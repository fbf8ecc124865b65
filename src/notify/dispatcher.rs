//! Notification Dispatcher
//!
//! Remembers, per vehicle, the set of critical alert ids already notified.
//! For each new health status:
//!
//! - every critical alert whose id is not in the set: notify once, add it
//! - ids no longer critical are dropped from the set, so a recurrence notifies again
//! - no critical alert at all: forget the vehicle
//!
//! Warnings never notify. The read-check-write runs under the `DashMap` entry
//! lock for the vehicle, so concurrent statuses for one vehicle cannot both fire.
//!
//! Delivery is fire-and-forget: `dispatch` decides synchronously and hands the
//! notifications to a background task, so a slow sink never holds up telemetry
//! processing. `drain` waits for outstanding deliveries.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{LogSink, Notification, NotificationSink};
use crate::types::HealthStatus;

pub struct NotificationDispatcher {
    notified: DashMap<String, HashSet<String>>,
    sinks: Arc<[Arc<dyn NotificationSink>]>,
    deliveries: Mutex<JoinSet<()>>,
}

impl NotificationDispatcher {
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self {
            notified: DashMap::new(),
            sinks: sinks.into(),
            deliveries: Mutex::new(JoinSet::new()),
        }
    }

    /// Dispatcher that only logs.
    pub fn logging() -> Self {
        let sinks: Vec<Arc<dyn NotificationSink>> = vec![Arc::new(LogSink)];
        Self::new(sinks)
    }

    /// Decide which critical alerts in `health` are new and record them.
    pub fn evaluate(&self, vehicle_id: &str, health: &HealthStatus) -> Vec<Notification> {
        let current: HashSet<&str> = health.critical_alerts().map(|a| a.id.as_str()).collect();
        if current.is_empty() {
            if self.notified.remove(vehicle_id).is_some() {
                debug!(vehicle_id, "Critical condition cleared");
            }
            return Vec::new();
        }

        let mut notified = self.notified.entry(vehicle_id.to_string()).or_default();
        notified.retain(|id| current.contains(id.as_str()));
        health
            .critical_alerts()
            .filter(|alert| notified.insert(alert.id.clone()))
            .map(|alert| Notification::for_alert(vehicle_id, alert))
            .collect()
    }

    /// Evaluate and queue delivery to every sink. Returns how many
    /// notifications were queued.
    pub fn dispatch(&self, vehicle_id: &str, health: &HealthStatus) -> usize {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(vehicle_id, "No runtime for notification delivery, skipping");
            return 0;
        };
        let notifications = self.evaluate(vehicle_id, health);
        if notifications.is_empty() {
            return 0;
        }
        let count = notifications.len();
        let sinks = Arc::clone(&self.sinks);
        let delivery = async move {
            for notification in &notifications {
                for sink in sinks.iter() {
                    sink.send(notification).await;
                }
            }
        };

        let mut deliveries = self.deliveries.lock().unwrap_or_else(PoisonError::into_inner);
        while deliveries.try_join_next().is_some() {}
        deliveries.spawn_on(delivery, &runtime);
        count
    }

    /// Wait for every queued delivery to finish.
    pub async fn drain(&self) {
        let mut pending = std::mem::take(
            &mut *self.deliveries.lock().unwrap_or_else(PoisonError::into_inner),
        );
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Notification delivery task failed");
            }
        }
    }

    /// Critical alert ids currently notified for a vehicle, sorted.
    pub fn notified_ids(&self, vehicle_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .notified
            .get(vehicle_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::logging()
    }
}
