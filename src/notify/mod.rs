//! Critical-alert notifications
//!
//! The `NotificationDispatcher` decides *whether* to notify (once per distinct
//! critical alert per vehicle); `NotificationSink`s decide *how*. Sinks are
//! fire-and-forget: delivery failures are logged by the sink and never reach
//! the dispatcher.

pub mod dispatcher;
pub mod webhook;

pub use dispatcher::NotificationDispatcher;
pub use webhook::WebhookSink;

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{Alert, AlertCategory};

/// One outbound notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub vehicle_id: String,
    pub alert_id: String,
    pub category: AlertCategory,
    pub title: String,
    pub body: String,
    pub timestamp: i64,
}

impl Notification {
    /// `CRITICAL ALERT: <CATEGORY>` with the alert message as body.
    pub fn for_alert(vehicle_id: &str, alert: &Alert) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            alert_id: alert.id.clone(),
            category: alert.category,
            title: format!("CRITICAL ALERT: {}", alert.category.to_string().to_uppercase()),
            body: alert.message.clone(),
            timestamp: alert.timestamp,
        }
    }
}

/// Delivery channel for notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: &Notification);

    /// Sink name for logging
    fn sink_name(&self) -> &'static str;
}

/// Writes notifications to the log. Always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, n: &Notification) {
        warn!(
            vehicle_id = %n.vehicle_id,
            alert_id = %n.alert_id,
            "{}: {}",
            n.title,
            n.body
        );
    }

    fn sink_name(&self) -> &'static str {
        "log"
    }
}

/// Keeps every notification in memory, for inspection by embedders and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    sent: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().map(|v| v.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl NotificationSink for MemorySink {
    async fn send(&self, notification: &Notification) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
    }

    fn sink_name(&self) -> &'static str {
        "memory"
    }
}
