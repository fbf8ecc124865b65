//! Storage collaborators
//!
//! The engine talks to its persistence through three traits so backends can be
//! swapped without touching pipeline code:
//! - `LeadStore`: lead records, partial updates, listing by tenant
//! - `TelemetryStore`: latest reading per vehicle, optional push stream
//! - `SecureVault`: role-gated access to sensitive lead fields
//!
//! `memory` provides in-process implementations used by the binary and tests.

pub mod memory;
pub mod vault;

pub use memory::{InMemoryLeadStore, InMemoryTelemetryStore};
pub use vault::{mask_secret, Caller, InMemoryVault, Role, SecureLeadData};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::types::{Lead, LeadPatch, NewLead, TelemetryReading};

/// Store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("lead not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid record: {0}")]
    Invalid(String),
}

/// Vault errors. `PermissionDenied` is distinct from `NotFound` so callers can
/// tell "you may not see this" apart from "there is nothing to see".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    #[error("insufficient permissions to access the secure vault (role: {0})")]
    PermissionDenied(Role),
    #[error("no secure record for lead {0}")]
    NotFound(String),
    #[error("vault backend error: {0}")]
    Backend(String),
}

/// Lead persistence.
///
/// Implementations bump `Lead::version` on every successful write.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Create a lead. The store assigns id, `created_at`, status `new` and version 1.
    async fn create(&self, lead: NewLead) -> Result<Lead, StoreError>;

    /// Apply a partial update and return the stored record.
    async fn update(&self, id: &str, patch: LeadPatch) -> Result<Lead, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Lead>, StoreError>;

    /// All leads belonging to a tenant, newest first.
    async fn list_by_tenant(&self, tenant_id: &str) -> Result<Vec<Lead>, StoreError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Latest-reading-per-vehicle telemetry persistence.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Replace the latest reading for `reading.vehicle_id`.
    async fn write(&self, reading: TelemetryReading) -> Result<(), StoreError>;

    async fn latest(&self, vehicle_id: &str) -> Result<Option<TelemetryReading>, StoreError>;

    async fn all(&self) -> Result<Vec<TelemetryReading>, StoreError>;

    /// Change stream, when the backend can push. `None` means poll instead.
    fn subscribe(&self) -> Option<broadcast::Receiver<TelemetryReading>> {
        None
    }

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Role-gated access to sensitive lead fields.
#[async_trait]
pub trait SecureVault: Send + Sync {
    /// Store (or replace) the sensitive record for a lead.
    async fn seal(&self, lead_id: &str, ssn: String) -> Result<(), VaultError>;

    /// Reveal the sensitive record for an authorized caller.
    async fn reveal(&self, lead_id: &str, caller: &Caller) -> Result<SecureLeadData, VaultError>;
}
