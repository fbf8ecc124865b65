//! Lead Pipeline - transition requests against the board and the store
//!
//! A move is validated and applied to the board under its write lock, then
//! persisted without holding the lock. A store failure leaves the optimistic
//! edit in place, marked failed, for the next sync cycle to reconcile.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::board::{LeadBoard, ReconcileSummary};
use super::transitions::{TransitionOutcome, TransitionSource};
use crate::storage::{LeadStore, StoreError};
use crate::types::{now_ms, Lead, LeadPatch};

#[derive(Clone)]
pub struct LeadPipeline {
    store: Arc<dyn LeadStore>,
    board: Arc<RwLock<LeadBoard>>,
}

impl LeadPipeline {
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self {
            store,
            board: Arc::new(RwLock::new(LeadBoard::new())),
        }
    }

    pub fn board(&self) -> Arc<RwLock<LeadBoard>> {
        Arc::clone(&self.board)
    }

    pub fn store(&self) -> Arc<dyn LeadStore> {
        Arc::clone(&self.store)
    }

    /// Request a stage change for a lead.
    ///
    /// Rejections are returned as `TransitionOutcome::Rejected` and never reach
    /// the store. Store failures are logged, not returned: the board keeps the
    /// optimistic stage until reconciliation.
    pub async fn move_lead(
        &self,
        id: &str,
        requested: &str,
        source: TransitionSource,
        reason: Option<&str>,
    ) -> TransitionOutcome {
        self.ensure_on_board(id).await;

        let outcome = self
            .board
            .write()
            .await
            .apply_optimistic(id, requested, source, reason, now_ms());
        let TransitionOutcome::Applied { to, .. } = outcome else {
            return outcome;
        };

        match self.store.update(id, LeadPatch::status(to)).await {
            Ok(stored) => {
                debug!(lead_id = id, version = stored.version, "Transition persisted");
                self.board.write().await.confirm(stored);
            }
            Err(e) => {
                warn!(lead_id = id, %to, error = %e, "Transition not persisted; will reconcile on next sync");
                self.board.write().await.fail(id);
            }
        }

        outcome
    }

    /// Pull a tenant's leads from the store and merge them into the board.
    pub async fn refresh(&self, tenant_id: &str) -> Result<ReconcileSummary, StoreError> {
        let snapshot = self.store.list_by_tenant(tenant_id).await?;
        Ok(self.apply_snapshot(snapshot).await)
    }

    /// Merge a store snapshot delivered by the sync layer.
    pub async fn apply_snapshot(&self, snapshot: Vec<Lead>) -> ReconcileSummary {
        self.board.write().await.reconcile(snapshot)
    }

    /// Load a lead the board has not seen yet (e.g. created since the last sync).
    async fn ensure_on_board(&self, id: &str) {
        if self.board.read().await.get(id).is_some() {
            return;
        }
        match self.store.get(id).await {
            Ok(Some(lead)) => {
                self.board.write().await.reconcile(vec![lead]);
            }
            Ok(None) => {}
            Err(e) => warn!(lead_id = id, error = %e, "Could not load lead onto board"),
        }
    }
}
