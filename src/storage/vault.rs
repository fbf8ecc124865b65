//! In-memory secure vault with role gating.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{SecureVault, VaultError};

/// Caller role as asserted by the authentication layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Anonymous,
    Agent,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Only dealership administrators may read vault contents.
    pub fn can_reveal_secrets(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Anonymous => write!(f, "anonymous"),
            Role::Agent => write!(f, "agent"),
            Role::Admin => write!(f, "admin"),
            Role::SuperAdmin => write!(f, "super_admin"),
        }
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    /// Unrecognised roles are treated as anonymous.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "agent" => Role::Agent,
            "admin" => Role::Admin,
            "super_admin" | "superadmin" => Role::SuperAdmin,
            _ => Role::Anonymous,
        })
    }
}

/// Who is asking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub user: Option<String>,
    pub role: Role,
}

impl Caller {
    pub fn new(user: impl Into<String>, role: Role) -> Self {
        Self {
            user: Some(user.into()),
            role,
        }
    }

    pub fn with_role(role: Role) -> Self {
        Self { user: None, role }
    }
}

/// Sensitive fields of a lead
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecureLeadData {
    pub ssn: String,
}

/// Mask all but the last four characters, for logs.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let keep = chars.len().saturating_sub(4);
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < keep && c.is_alphanumeric() { '*' } else { *c })
        .collect()
}

/// Vault backed by a map, gated on `Role::can_reveal_secrets`.
#[derive(Default)]
pub struct InMemoryVault {
    records: RwLock<HashMap<String, String>>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecureVault for InMemoryVault {
    async fn seal(&self, lead_id: &str, ssn: String) -> Result<(), VaultError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| VaultError::Backend(e.to_string()))?;
        records.insert(lead_id.to_string(), ssn);
        Ok(())
    }

    async fn reveal(&self, lead_id: &str, caller: &Caller) -> Result<SecureLeadData, VaultError> {
        if !caller.role.can_reveal_secrets() {
            warn!(lead_id, role = %caller.role, "Vault access denied");
            return Err(VaultError::PermissionDenied(caller.role));
        }

        let records = self
            .records
            .read()
            .map_err(|e| VaultError::Backend(e.to_string()))?;
        let ssn = records
            .get(lead_id)
            .cloned()
            .ok_or_else(|| VaultError::NotFound(lead_id.to_string()))?;

        info!(
            lead_id,
            user = caller.user.as_deref().unwrap_or("-"),
            role = %caller.role,
            ssn = %mask_secret(&ssn),
            "Vault record revealed"
        );
        Ok(SecureLeadData { ssn })
    }
}
