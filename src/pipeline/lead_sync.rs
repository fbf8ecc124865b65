//! Lead sync loop: keeps the pipeline board in step with the lead store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::lifecycle::LeadPipeline;
use crate::sync::subscribe_leads;
use crate::types::Lead;

/// Poll `tenant_id`'s leads every `interval` and reconcile them into the board
/// until cancelled.
pub async fn run_lead_sync(
    pipeline: Arc<LeadPipeline>,
    tenant_id: String,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<Lead>>();
    let subscription = subscribe_leads(pipeline.store(), &tenant_id, interval, move |leads| {
        if tx.send(leads).is_err() {
            warn!("Lead sync channel closed");
        }
    });
    info!(
        tenant = %tenant_id,
        interval_ms = interval.as_millis() as u64,
        backend = pipeline.store().backend_name(),
        "Lead sync started"
    );

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!(tenant = %tenant_id, "Lead sync received shutdown signal");
                break;
            }
            snapshot = rx.recv() => {
                let Some(leads) = snapshot else { break };
                let summary = pipeline.apply_snapshot(leads).await;
                if summary.rolled_back > 0 || summary.inserted > 0 {
                    info!(
                        tenant = %tenant_id,
                        inserted = summary.inserted,
                        rolled_back = summary.rolled_back,
                        "Board reconciled"
                    );
                } else {
                    debug!(tenant = %tenant_id, ?summary, "Board reconciled");
                }
            }
        }
    }

    subscription.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryLeadStore, LeadStore};
    use crate::types::NewLead;

    #[tokio::test]
    async fn board_picks_up_leads_created_elsewhere() {
        let store = Arc::new(InMemoryLeadStore::new());
        let pipeline = Arc::new(LeadPipeline::new(store.clone()));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_lead_sync(
            Arc::clone(&pipeline),
            "t1".to_string(),
            Duration::from_millis(20),
            cancel.clone(),
        ));

        let lead = store
            .create(NewLead {
                tenant_id: "t1".to_string(),
                name: "Carla".to_string(),
                ..NewLead::default()
            })
            .await
            .unwrap();

        let board = pipeline.board();
        for _ in 0..50 {
            if board.read().await.get(&lead.id).is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(board.read().await.get(&lead.id).is_some());

        cancel.cancel();
        task.await.unwrap();
    }
}
