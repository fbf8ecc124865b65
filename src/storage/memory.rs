//! In-memory lead and telemetry stores
//!
//! Thread-safe via `RwLock`. Not durable: data is lost on restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{LeadStore, StoreError, TelemetryStore};
use crate::config::defaults::TELEMETRY_CHANNEL_CAPACITY;
use crate::types::{now_ms, Lead, LeadPatch, LeadStatus, NewLead, TelemetryReading};

// ============================================================================
// Leads
// ============================================================================

/// In-memory lead store.
///
/// `set_unavailable(true)` makes every call fail with `StoreError::Unavailable`,
/// which lets callers exercise their outage handling.
#[derive(Default)]
pub struct InMemoryLeadStore {
    leads: RwLock<HashMap<String, Lead>>,
    unavailable: AtomicBool,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing records, keeping their ids and versions.
    pub fn with_leads(leads: impl IntoIterator<Item = Lead>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.leads.write() {
            map.extend(leads.into_iter().map(|l| (l.id.clone(), l)));
        }
        store
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("lead store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn create(&self, new: NewLead) -> Result<Lead, StoreError> {
        self.check_available()?;
        if new.name.trim().is_empty() {
            return Err(StoreError::Invalid("lead name is required".to_string()));
        }

        let lead = Lead {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: new.tenant_id,
            name: new.name,
            phone: new.phone,
            email: new.email,
            channel: new.channel,
            status: LeadStatus::New,
            car_id: new.car_id,
            vehicle_id: new.vehicle_id,
            vehicle_of_interest: new.vehicle_of_interest,
            // Sensitive fields live in the vault, never in the lead record
            ssn: None,
            ai_score: new.ai_score,
            created_at: now_ms(),
            version: 1,
            ..Lead::default()
        };

        let mut leads = self
            .leads
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        leads.insert(lead.id.clone(), lead.clone());
        Ok(lead)
    }

    async fn update(&self, id: &str, patch: LeadPatch) -> Result<Lead, StoreError> {
        self.check_available()?;
        let mut leads = self
            .leads
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let lead = leads
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply_to(lead);
        lead.version += 1;
        Ok(lead.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Lead>, StoreError> {
        self.check_available()?;
        let leads = self
            .leads
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(leads.get(id).cloned())
    }

    async fn list_by_tenant(&self, tenant_id: &str) -> Result<Vec<Lead>, StoreError> {
        self.check_available()?;
        let leads = self
            .leads
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let mut list: Vec<Lead> = leads
            .values()
            .filter(|l| l.tenant_id == tenant_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(list)
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

// ============================================================================
// Telemetry
// ============================================================================

/// In-memory telemetry store with a broadcast change stream.
pub struct InMemoryTelemetryStore {
    latest: RwLock<HashMap<String, TelemetryReading>>,
    changes: broadcast::Sender<TelemetryReading>,
    push_enabled: bool,
}

impl InMemoryTelemetryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(TELEMETRY_CHANNEL_CAPACITY);
        Self {
            latest: RwLock::new(HashMap::new()),
            changes,
            push_enabled: true,
        }
    }

    /// A store that offers no change stream, so consumers fall back to polling.
    pub fn polling_only() -> Self {
        Self {
            push_enabled: false,
            ..Self::new()
        }
    }
}

impl Default for InMemoryTelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelemetryStore for InMemoryTelemetryStore {
    async fn write(&self, reading: TelemetryReading) -> Result<(), StoreError> {
        if reading.vehicle_id.trim().is_empty() {
            return Err(StoreError::Invalid("vehicleId is required".to_string()));
        }
        {
            let mut latest = self
                .latest
                .write()
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            latest.insert(reading.vehicle_id.clone(), reading.clone());
        }
        if self.push_enabled {
            // No subscribers is fine
            let _ = self.changes.send(reading);
        }
        Ok(())
    }

    async fn latest(&self, vehicle_id: &str) -> Result<Option<TelemetryReading>, StoreError> {
        let latest = self
            .latest
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(latest.get(vehicle_id).cloned())
    }

    async fn all(&self) -> Result<Vec<TelemetryReading>, StoreError> {
        let latest = self
            .latest
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let mut readings: Vec<TelemetryReading> = latest.values().cloned().collect();
        readings.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        Ok(readings)
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<TelemetryReading>> {
        self.push_enabled.then(|| self.changes.subscribe())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeoPoint, LeadChannel};

    fn new_lead(tenant: &str, name: &str) -> NewLead {
        NewLead {
            tenant_id: tenant.to_string(),
            name: name.to_string(),
            channel: LeadChannel::Whatsapp,
            ssn: Some("123-45-6789".to_string()),
            ..NewLead::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_identity_and_strips_secrets() {
        let store = InMemoryLeadStore::new();
        let lead = store.create(new_lead("t1", "Ana")).await.unwrap();

        assert!(!lead.id.is_empty());
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.version, 1);
        assert!(lead.ssn.is_none());
        assert!(lead.created_at > 0);
    }

    #[tokio::test]
    async fn update_bumps_version() {
        let store = InMemoryLeadStore::new();
        let lead = store.create(new_lead("t1", "Ana")).await.unwrap();

        let updated = store
            .update(&lead.id, LeadPatch::status(LeadStatus::Contacted))
            .await
            .unwrap();
        assert_eq!(updated.status, LeadStatus::Contacted);
        assert_eq!(updated.version, 2);
    }

    #[tokio::test]
    async fn update_missing_lead_is_not_found() {
        let store = InMemoryLeadStore::new();
        let err = store
            .update("nope", LeadPatch::status(LeadStatus::Contacted))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound("nope".to_string()));
    }

    #[tokio::test]
    async fn list_is_scoped_to_tenant() {
        let store = InMemoryLeadStore::new();
        store.create(new_lead("t1", "Ana")).await.unwrap();
        store.create(new_lead("t1", "Luis")).await.unwrap();
        store.create(new_lead("t2", "Marta")).await.unwrap();

        assert_eq!(store.list_by_tenant("t1").await.unwrap().len(), 2);
        assert_eq!(store.list_by_tenant("t2").await.unwrap().len(), 1);
        assert!(store.list_by_tenant("t3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn outage_fails_every_call() {
        let store = InMemoryLeadStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.create(new_lead("t1", "Ana")).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.list_by_tenant("t1").await.is_err());
    }

    #[tokio::test]
    async fn telemetry_keeps_latest_and_pushes() {
        let store = InMemoryTelemetryStore::new();
        let mut rx = store.subscribe().unwrap();

        let first = TelemetryReading::new("veh-1", 10.0, 1200.0, 50.0, 90.0, 12.6, GeoPoint::default(), 1);
        let second = TelemetryReading::new("veh-1", 20.0, 1700.0, 49.0, 91.0, 12.6, GeoPoint::default(), 2);
        store.write(first).await.unwrap();
        store.write(second.clone()).await.unwrap();

        assert_eq!(store.latest("veh-1").await.unwrap(), Some(second));
        assert_eq!(store.all().await.unwrap().len(), 1);
        assert_eq!(rx.recv().await.unwrap().last_update, 1);
        assert_eq!(rx.recv().await.unwrap().last_update, 2);
    }

    #[tokio::test]
    async fn polling_only_store_has_no_stream() {
        let store = InMemoryTelemetryStore::polling_only();
        assert!(store.subscribe().is_none());
    }
}
