//! Vault-gated sensitive lead data

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Serialize;
use tracing::{info, warn};

use super::AppState;
use crate::api::envelope::ApiResponse;
use crate::storage::{mask_secret, Caller, Role, VaultError};

pub const ROLE_HEADER: &str = "x-role";
pub const USER_HEADER: &str = "x-user";

/// Caller identity from `X-Role` / `X-User`. Missing or unknown roles are anonymous.
pub fn caller_from_headers(headers: &HeaderMap) -> Caller {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let role = header(ROLE_HEADER)
        .and_then(|r| r.parse::<Role>().ok())
        .unwrap_or_default();
    Caller {
        user: header(USER_HEADER).map(str::to_string),
        role,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureDataResponse {
    pub lead_id: String,
    pub ssn: String,
    pub masked: String,
}

/// GET /api/v1/leads/:id/secure
pub async fn get_secure_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let caller = caller_from_headers(&headers);

    match state.vault.reveal(&id, &caller).await {
        Ok(data) => {
            info!(lead_id = %id, user = ?caller.user, role = %caller.role, "Secure data revealed");
            ApiResponse::ok(SecureDataResponse {
                lead_id: id,
                masked: mask_secret(&data.ssn),
                ssn: data.ssn,
            })
        }
        Err(e) => {
            if matches!(e, VaultError::PermissionDenied(_)) {
                warn!(lead_id = %id, user = ?caller.user, role = %caller.role, "Secure data access denied");
            }
            e.into()
        }
    }
}
