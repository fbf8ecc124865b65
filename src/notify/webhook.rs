//! HTTP webhook sink: `POST {url}` with the notification as JSON.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{Notification, NotificationSink};

#[derive(Clone)]
pub struct WebhookSink {
    http: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, notification: &Notification) {
        match self.http.post(&self.url).json(notification).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(alert_id = %notification.alert_id, "Webhook delivered");
            }
            Ok(resp) => {
                warn!(alert_id = %notification.alert_id, status = %resp.status(), "Webhook rejected notification");
            }
            Err(e) => {
                warn!(alert_id = %notification.alert_id, error = %e, "Webhook delivery failed");
            }
        }
    }

    fn sink_name(&self) -> &'static str {
        "webhook"
    }
}
