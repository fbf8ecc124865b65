//! Sync Layer - near-real-time delivery of store changes
//!
//! Two subscription styles, both returning a `SubscriptionHandle`:
//!
//! - **Polling**: fetch once immediately, then on a fixed interval. One task per
//!   subscription runs fetch and callback sequentially, so fetches never overlap
//!   and callbacks fire in fetch-completion order. A failed fetch is logged and
//!   the loop waits for the next tick.
//! - **Push**: consume a `broadcast` change stream when the store offers one.
//!
//! Cancelling (explicitly or by dropping the handle) stops the timer and the
//! task. Once `cancel` returns no callback is running and none will start.
//! `cancel` must not be called from inside the subscription's own callback.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::storage::{LeadStore, TelemetryStore};
use crate::types::{Lead, TelemetryReading};

/// Cancellation handle for a running subscription
pub struct SubscriptionHandle {
    name: String,
    cancel: CancellationToken,
    /// Held while a callback runs; taken by `cancel` to wait one out
    gate: Arc<Mutex<()>>,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the subscription. Idempotent.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            debug!(subscription = %self.name, "Subscription cancelled");
        }
        self.cancel.cancel();
        // Wait out a callback that is mid-flight
        drop(self.gate.lock());
    }

    /// Cancel and wait for the task to finish.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run `callback` under the gate unless the subscription was cancelled.
fn deliver<T>(cancel: &CancellationToken, gate: &Mutex<()>, callback: &mut impl FnMut(T), value: T) -> bool {
    let _guard = gate.lock();
    if cancel.is_cancelled() {
        return false;
    }
    callback(value);
    true
}

/// Poll `fetch` immediately and then every `interval`, passing results to `callback`.
pub fn subscribe_polling<T, E, F, Fut, C>(
    name: &str,
    interval: Duration,
    mut fetch: F,
    mut callback: C,
) -> SubscriptionHandle
where
    T: Send + 'static,
    E: Display + Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    C: FnMut(T) + Send + 'static,
{
    let cancel = CancellationToken::new();
    let gate = Arc::new(Mutex::new(()));
    let task_cancel = cancel.clone();
    let task_gate = Arc::clone(&gate);
    let task_name = name.to_string();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_failures: u32 = 0;

        loop {
            tokio::select! {
                biased;
                _ = task_cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;
                _ = task_cancel.cancelled() => break,
                result = fetch() => result,
            };

            match result {
                Ok(value) => {
                    consecutive_failures = 0;
                    if !deliver(&task_cancel, &task_gate, &mut callback, value) {
                        break;
                    }
                }
                Err(e) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    warn!(
                        subscription = %task_name,
                        error = %e,
                        consecutive_failures,
                        "Sync fetch failed, retrying next tick"
                    );
                }
            }
        }
        debug!(subscription = %task_name, "Polling loop stopped");
    });

    SubscriptionHandle {
        name: name.to_string(),
        cancel,
        gate,
        task: Some(task),
    }
}

/// Deliver every value from a change stream to `callback` until cancelled or
/// the stream closes.
pub fn subscribe_push<T, C>(name: &str, mut rx: broadcast::Receiver<T>, mut callback: C) -> SubscriptionHandle
where
    T: Clone + Send + 'static,
    C: FnMut(T) + Send + 'static,
{
    let cancel = CancellationToken::new();
    let gate = Arc::new(Mutex::new(()));
    let task_cancel = cancel.clone();
    let task_gate = Arc::clone(&gate);
    let task_name = name.to_string();

    let task = tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                biased;
                _ = task_cancel.cancelled() => break,
                received = rx.recv() => received,
            };

            match received {
                Ok(value) => {
                    if !deliver(&task_cancel, &task_gate, &mut callback, value) {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(subscription = %task_name, skipped, "Change stream lagged, updates skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!(subscription = %task_name, "Change stream closed");
                    break;
                }
            }
        }
    });

    SubscriptionHandle {
        name: name.to_string(),
        cancel,
        gate,
        task: Some(task),
    }
}

/// Observe a tenant's leads by polling the lead store.
pub fn subscribe_leads<C>(
    store: Arc<dyn LeadStore>,
    tenant_id: &str,
    interval: Duration,
    callback: C,
) -> SubscriptionHandle
where
    C: FnMut(Vec<Lead>) + Send + 'static,
{
    let tenant = tenant_id.to_string();
    subscribe_polling(
        &format!("leads:{tenant_id}"),
        interval,
        move || {
            let store = Arc::clone(&store);
            let tenant = tenant.clone();
            async move { store.list_by_tenant(&tenant).await }
        },
        callback,
    )
}

/// Observe telemetry: push when the store provides a change stream, otherwise
/// poll and deliver only readings that changed since the previous poll.
pub fn subscribe_telemetry<C>(
    store: Arc<dyn TelemetryStore>,
    interval: Duration,
    mut callback: C,
) -> SubscriptionHandle
where
    C: FnMut(Vec<TelemetryReading>) + Send + 'static,
{
    if let Some(rx) = store.subscribe() {
        info!(backend = store.backend_name(), "Telemetry sync using push");
        return subscribe_push("telemetry", rx, move |reading| callback(vec![reading]));
    }

    info!(
        backend = store.backend_name(),
        interval_ms = interval.as_millis() as u64,
        "Telemetry sync using polling"
    );
    let seen: Arc<Mutex<HashMap<String, i64>>> = Arc::default();
    subscribe_polling(
        "telemetry",
        interval,
        move || {
            let store = Arc::clone(&store);
            let seen = Arc::clone(&seen);
            async move {
                let readings = store.all().await?;
                let mut seen = seen
                    .lock()
                    .map_err(|e| crate::storage::StoreError::Unavailable(e.to_string()))?;
                Ok::<_, crate::storage::StoreError>(
                    readings
                        .into_iter()
                        .filter(|r| seen.insert(r.vehicle_id.clone(), r.last_update) != Some(r.last_update))
                        .collect::<Vec<_>>(),
                )
            }
        },
        move |changed: Vec<TelemetryReading>| {
            if !changed.is_empty() {
                callback(changed);
            }
        },
    )
}
