//! Lead Board - local projection of the lead store
//!
//! The board is what operators see and drag cards on. Transitions are applied
//! here first (optimistically) and persisted afterwards; the board converges on
//! the store's view through `reconcile`, driven by the lead sync loop.
//!
//! ## Reconciliation
//!
//! Each entry remembers the store `version` it was last confirmed at. While a
//! write is in flight the optimistic edit is kept until a snapshot shows a
//! version newer than that base. A failed write is replaced by whatever the
//! next snapshot says. Snapshots older than the local view are ignored.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use tracing::{debug, info};

use super::transitions::{self, RejectReason, TransitionOutcome, TransitionSource};
use crate::types::{Lead, LeadStatus};

/// Maximum transition records kept in memory.
pub const MAX_TRANSITION_HISTORY: usize = 500;

/// State of a local edit the store has not confirmed
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PendingWrite {
    /// Sent to the store, no answer yet
    InFlight { base_version: u64 },
    /// Store rejected or was unreachable; awaiting the next snapshot
    Failed { base_version: u64 },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardEntry {
    pub lead: Lead,
    pub pending: Option<PendingWrite>,
}

/// One applied stage change (audit trail)
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub lead_id: String,
    pub from: LeadStatus,
    pub to: LeadStatus,
    pub source: TransitionSource,
    pub message: String,
    pub timestamp: i64,
}

/// Counts from one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub inserted: usize,
    pub replaced: usize,
    pub kept_local: usize,
    pub rolled_back: usize,
    pub stale: usize,
}

#[derive(Debug, Default)]
pub struct LeadBoard {
    entries: HashMap<String, BoardEntry>,
    history: VecDeque<TransitionRecord>,
}

impl LeadBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&BoardEntry> {
        self.entries.get(id)
    }

    pub fn lead(&self, id: &str) -> Option<&Lead> {
        self.entries.get(id).map(|e| &e.lead)
    }

    /// Leads on the board, optionally restricted to one tenant.
    pub fn leads(&self, tenant_id: Option<&str>) -> Vec<Lead> {
        self.entries
            .values()
            .filter(|e| tenant_id.map_or(true, |t| e.lead.tenant_id == t))
            .map(|e| e.lead.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recent transitions, newest last.
    pub fn history(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.history.iter()
    }

    /// Insert or replace a lead confirmed by the store.
    pub fn upsert_confirmed(&mut self, lead: Lead) {
        self.entries.insert(
            lead.id.clone(),
            BoardEntry {
                lead,
                pending: None,
            },
        );
    }

    /// Validate and apply a transition locally.
    ///
    /// On success the entry is marked in flight and the caller is expected to
    /// persist the change, then report back through `confirm` or `fail`.
    pub fn apply_optimistic(
        &mut self,
        id: &str,
        requested: &str,
        source: TransitionSource,
        reason: Option<&str>,
        now: i64,
    ) -> TransitionOutcome {
        let Some(entry) = self.entries.get_mut(id) else {
            return TransitionOutcome::Rejected {
                reason: RejectReason::UnknownLead(id.to_string()),
            };
        };

        let outcome = transitions::validate(entry.lead.status, requested);
        let TransitionOutcome::Applied { from, to } = outcome else {
            debug!(lead_id = id, requested, ?outcome, "Transition rejected");
            return outcome;
        };

        let base_version = match entry.pending {
            Some(PendingWrite::InFlight { base_version } | PendingWrite::Failed { base_version }) => {
                base_version
            }
            None => entry.lead.version,
        };
        entry.lead.status = to;
        entry.pending = Some(PendingWrite::InFlight { base_version });

        let message = transitions::lifecycle_message(&entry.lead.name, to, reason);
        info!(lead_id = id, %from, %to, ?source, "{}", message);

        self.history.push_back(TransitionRecord {
            lead_id: id.to_string(),
            from,
            to,
            source,
            message,
            timestamp: now,
        });
        while self.history.len() > MAX_TRANSITION_HISTORY {
            self.history.pop_front();
        }

        outcome
    }

    /// The store accepted the write and returned its record.
    pub fn confirm(&mut self, stored: Lead) {
        match self.entries.get_mut(&stored.id) {
            Some(entry) if stored.version < entry.lead.version => {
                debug!(lead_id = %stored.id, "Ignoring confirmation older than local view");
            }
            Some(entry) => {
                entry.lead = stored;
                entry.pending = None;
            }
            None => self.upsert_confirmed(stored),
        }
    }

    /// The store write failed. The optimistic edit stays visible until the
    /// next snapshot replaces it.
    pub fn fail(&mut self, id: &str) {
        if let Some(entry) = self.entries.get_mut(id) {
            if let Some(PendingWrite::InFlight { base_version }) = entry.pending {
                entry.pending = Some(PendingWrite::Failed { base_version });
            }
        }
    }

    /// Merge an authoritative snapshot from the store.
    pub fn reconcile(&mut self, snapshot: Vec<Lead>) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        for remote in snapshot {
            let Some(entry) = self.entries.get_mut(&remote.id) else {
                summary.inserted += 1;
                self.upsert_confirmed(remote);
                continue;
            };

            match entry.pending {
                None => {
                    if remote.version >= entry.lead.version {
                        if remote != entry.lead {
                            summary.replaced += 1;
                        }
                        entry.lead = remote;
                    } else {
                        summary.stale += 1;
                    }
                }
                Some(PendingWrite::InFlight { base_version }) => {
                    if remote.version > base_version {
                        summary.replaced += 1;
                        entry.lead = remote;
                        entry.pending = None;
                    } else {
                        summary.kept_local += 1;
                    }
                }
                Some(PendingWrite::Failed { base_version }) => {
                    if remote.version >= base_version {
                        info!(
                            lead_id = %remote.id,
                            local = %entry.lead.status,
                            store = %remote.status,
                            "Reverting unconfirmed transition to store state"
                        );
                        summary.rolled_back += 1;
                        entry.lead = remote;
                        entry.pending = None;
                    } else {
                        summary.stale += 1;
                    }
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(id: &str, status: LeadStatus, version: u64) -> Lead {
        Lead {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            name: "Ana".to_string(),
            status,
            version,
            ..Lead::default()
        }
    }

    fn board_with(leads: Vec<Lead>) -> LeadBoard {
        let mut board = LeadBoard::new();
        board.reconcile(leads);
        board
    }

    #[test]
    fn optimistic_move_is_visible_immediately() {
        let mut board = board_with(vec![lead("l1", LeadStatus::New, 1)]);
        let outcome = board.apply_optimistic("l1", "contacted", TransitionSource::Manual, None, 10);

        assert!(outcome.is_applied());
        assert_eq!(board.lead("l1").unwrap().status, LeadStatus::Contacted);
        assert_eq!(
            board.get("l1").unwrap().pending,
            Some(PendingWrite::InFlight { base_version: 1 })
        );
        assert_eq!(board.history().count(), 1);
    }

    #[test]
    fn rejected_move_leaves_board_untouched() {
        let mut board = board_with(vec![lead("l1", LeadStatus::New, 1)]);
        let outcome = board.apply_optimistic("l1", "sold", TransitionSource::Manual, None, 10);

        assert!(!outcome.is_applied());
        assert_eq!(board.lead("l1").unwrap().status, LeadStatus::New);
        assert!(board.get("l1").unwrap().pending.is_none());
        assert_eq!(board.history().count(), 0);
    }

    #[test]
    fn unknown_lead_is_rejected() {
        let mut board = LeadBoard::new();
        assert_eq!(
            board.apply_optimistic("ghost", "contacted", TransitionSource::Automated, None, 0),
            TransitionOutcome::Rejected {
                reason: RejectReason::UnknownLead("ghost".to_string())
            }
        );
    }

    #[test]
    fn snapshot_predating_write_keeps_local_edit() {
        let mut board = board_with(vec![lead("l1", LeadStatus::New, 1)]);
        board.apply_optimistic("l1", "contacted", TransitionSource::Manual, None, 10);

        let summary = board.reconcile(vec![lead("l1", LeadStatus::New, 1)]);
        assert_eq!(summary.kept_local, 1);
        assert_eq!(board.lead("l1").unwrap().status, LeadStatus::Contacted);
    }

    #[test]
    fn newer_snapshot_settles_in_flight_write() {
        let mut board = board_with(vec![lead("l1", LeadStatus::New, 1)]);
        board.apply_optimistic("l1", "contacted", TransitionSource::Manual, None, 10);

        board.reconcile(vec![lead("l1", LeadStatus::Contacted, 2)]);
        let entry = board.get("l1").unwrap();
        assert_eq!(entry.lead.version, 2);
        assert!(entry.pending.is_none());
    }

    #[test]
    fn failed_write_converges_to_store_state() {
        let mut board = board_with(vec![lead("l1", LeadStatus::New, 1)]);
        board.apply_optimistic("l1", "contacted", TransitionSource::Manual, None, 10);
        board.fail("l1");

        // Still shown optimistically until the next snapshot
        assert_eq!(board.lead("l1").unwrap().status, LeadStatus::Contacted);

        let summary = board.reconcile(vec![lead("l1", LeadStatus::New, 1)]);
        assert_eq!(summary.rolled_back, 1);
        assert_eq!(board.lead("l1").unwrap().status, LeadStatus::New);
        assert!(board.get("l1").unwrap().pending.is_none());
    }

    #[test]
    fn confirmation_replaces_optimistic_entry() {
        let mut board = board_with(vec![lead("l1", LeadStatus::New, 1)]);
        board.apply_optimistic("l1", "contacted", TransitionSource::Manual, None, 10);
        board.confirm(lead("l1", LeadStatus::Contacted, 2));

        let entry = board.get("l1").unwrap();
        assert_eq!(entry.lead.version, 2);
        assert!(entry.pending.is_none());
    }

    #[test]
    fn older_snapshot_is_discarded() {
        let mut board = board_with(vec![lead("l1", LeadStatus::Negotiation, 5)]);
        let summary = board.reconcile(vec![lead("l1", LeadStatus::Contacted, 3)]);

        assert_eq!(summary.stale, 1);
        assert_eq!(board.lead("l1").unwrap().status, LeadStatus::Negotiation);
    }

    #[test]
    fn chained_moves_keep_original_base_version() {
        let mut board = board_with(vec![lead("l1", LeadStatus::New, 1)]);
        board.apply_optimistic("l1", "contacted", TransitionSource::Manual, None, 10);
        board.apply_optimistic("l1", "negotiation", TransitionSource::Manual, None, 11);

        assert_eq!(
            board.get("l1").unwrap().pending,
            Some(PendingWrite::InFlight { base_version: 1 })
        );
    }

    #[test]
    fn tenant_filter() {
        let mut other = lead("l2", LeadStatus::New, 1);
        other.tenant_id = "t2".to_string();
        let board = board_with(vec![lead("l1", LeadStatus::New, 1), other]);

        assert_eq!(board.leads(Some("t1")).len(), 1);
        assert_eq!(board.leads(None).len(), 2);
    }

    #[test]
    fn history_is_bounded() {
        let mut board = LeadBoard::new();
        for i in 0..(MAX_TRANSITION_HISTORY + 10) {
            let id = format!("l{i}");
            board.upsert_confirmed(lead(&id, LeadStatus::New, 1));
            board.apply_optimistic(&id, "lost", TransitionSource::Automated, Some("no budget"), 0);
        }
        assert_eq!(board.history().count(), MAX_TRANSITION_HISTORY);
    }
}
