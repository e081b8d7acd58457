//! Administrative endpoints, guarded by a shared bearer token.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::AUTHORIZATION, HeaderMap},
    routing::post,
    Json, Router,
};
use premium_link_types::WalletAddress;
use serde::{Deserialize, Serialize};

use super::premium::parse_profile;
use crate::error::AppError;
use crate::state::AppState;

/// Request body for revoking a profile's binding.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRequest {
    pub profile_id: String,
}

/// Response for a revoke request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeResponse {
    /// False when the profile had no active binding.
    pub revoked: bool,
    /// Wallet that held the revoked binding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<WalletAddress>,
}

/// Creates the admin router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/admin/revoke", post(revoke))
        .with_state(state)
}

/// Checks the request's bearer token against the configured admin token.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(AppError::NotFound("Admin API is disabled".to_string()));
    };

    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        return Err(AppError::Unauthorized("Invalid admin token".to_string()));
    }

    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// POST /api/v1/premium/admin/revoke
///
/// Deactivates whatever binding currently holds the profile.
async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RevokeRequest>, JsonRejection>,
) -> Result<Json<RevokeResponse>, AppError> {
    authorize(&state, &headers)?;

    let Json(request) = payload?;
    let profile = parse_profile(&request.profile_id)?;

    let revoked = state.engine.revoke_profile(&profile).await?;
    Ok(Json(RevokeResponse {
        revoked: revoked.is_some(),
        wallet_address: revoked.map(|b| b.wallet_address),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret2"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_revoke_response_serialization() {
        let response = RevokeResponse {
            revoked: false,
            wallet_address: None,
        };
        assert_eq!(serde_json::to_string(&response).unwrap(), r#"{"revoked":false}"#);
    }
}
