//! Premium linking endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use premium_link_types::{ProfileId, UserStatus, WalletAddress};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, LinkError};
use crate::models::{Binding, DeactivationReason, OwnedProfile};
use crate::state::AppState;
use crate::status::{LinkedProfile, StatusReport};

/// Request body for linking a specific profile.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
    /// Wallet requesting the link (any letter case).
    pub wallet_address: String,
    /// Profile the wallet claims to own.
    pub profile_id: String,
}

/// Request body for endpoints that only need a wallet.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRequest {
    pub wallet_address: String,
}

/// Response for a created (or already existing) binding.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingResponse {
    pub id: Uuid,
    pub wallet_address: WalletAddress,
    pub profile_id: ProfileId,
    pub is_active: bool,
    pub linked_at: DateTime<Utc>,
}

impl From<Binding> for BindingResponse {
    fn from(binding: Binding) -> Self {
        Self {
            id: binding.id,
            wallet_address: binding.wallet_address,
            profile_id: binding.profile_id,
            is_active: binding.is_active,
            linked_at: binding.linked_at,
        }
    }
}

/// Response listing a wallet's linkable profiles.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilesResponse {
    /// Owned profiles not linked to another wallet.
    pub profiles: Vec<OwnedProfile>,
    pub can_link: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_profile: Option<LinkedProfile>,
}

/// Response for the status endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub user_status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_profile: Option<LinkedProfile>,
}

impl From<StatusReport> for StatusResponse {
    fn from(report: StatusReport) -> Self {
        Self {
            user_status: report.user_status,
            linked_profile: report.linked_profile,
        }
    }
}

/// Response for the unlink endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlinkResponse {
    /// False when the wallet had nothing to unlink.
    pub unlinked: bool,
}

/// One entry of a wallet's binding history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub profile_id: ProfileId,
    pub is_active: bool,
    pub linked_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivation_reason: Option<DeactivationReason>,
}

impl From<Binding> for HistoryEntry {
    fn from(binding: Binding) -> Self {
        Self {
            id: binding.id,
            profile_id: binding.profile_id,
            is_active: binding.is_active,
            linked_at: binding.linked_at,
            deactivated_at: binding.deactivated_at,
            deactivation_reason: binding.deactivation_reason,
        }
    }
}

/// Response for the history endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub wallet_address: WalletAddress,
    /// Newest first.
    pub bindings: Vec<HistoryEntry>,
}

/// Creates the premium router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/link", post(link_profile))
        .route("/auto-link", post(auto_link))
        .route("/profiles", post(list_profiles))
        .route("/status", post(get_status))
        .route("/unlink", post(unlink))
        .route("/history/{wallet_address}", get(get_history))
        .with_state(state)
}

pub(crate) fn parse_wallet(raw: &str) -> Result<WalletAddress, LinkError> {
    WalletAddress::parse(raw).map_err(|e| LinkError::invalid_wallet("walletAddress", e))
}

pub(crate) fn parse_profile(raw: &str) -> Result<ProfileId, LinkError> {
    ProfileId::parse(raw).map_err(|e| LinkError::invalid_profile("profileId", e))
}

/// POST /api/v1/premium/link
///
/// Links the wallet to a profile it owns. Linking a different profile
/// replaces the wallet's previous binding.
async fn link_profile(
    State(state): State<AppState>,
    payload: Result<Json<LinkRequest>, JsonRejection>,
) -> Result<Json<BindingResponse>, AppError> {
    let Json(request) = payload?;
    let wallet = parse_wallet(&request.wallet_address)?;
    let profile = parse_profile(&request.profile_id)?;

    let binding = state.engine.link_profile(&wallet, &profile).await?;
    Ok(Json(binding.into()))
}

/// POST /api/v1/premium/auto-link
///
/// Links the first eligible profile the wallet owns.
async fn auto_link(
    State(state): State<AppState>,
    payload: Result<Json<WalletRequest>, JsonRejection>,
) -> Result<Json<BindingResponse>, AppError> {
    let Json(request) = payload?;
    let wallet = parse_wallet(&request.wallet_address)?;

    let binding = state
        .engine
        .auto_link_first_profile(&wallet)
        .await?
        .into_result()?;
    Ok(Json(binding.into()))
}

/// POST /api/v1/premium/profiles
///
/// Lists the wallet's owned profiles that are not linked elsewhere.
async fn list_profiles(
    State(state): State<AppState>,
    payload: Result<Json<WalletRequest>, JsonRejection>,
) -> Result<Json<ProfilesResponse>, AppError> {
    let Json(request) = payload?;
    let wallet = parse_wallet(&request.wallet_address)?;

    let eligibility = state.eligibility.eligible_profiles(&wallet).await?;
    Ok(Json(ProfilesResponse {
        linked_profile: eligibility.current_binding.as_ref().map(LinkedProfile::from),
        profiles: eligibility.profiles,
        can_link: eligibility.can_link,
    }))
}

/// POST /api/v1/premium/status
async fn get_status(
    State(state): State<AppState>,
    payload: Result<Json<WalletRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, AppError> {
    let Json(request) = payload?;
    let wallet = parse_wallet(&request.wallet_address)?;

    let report = state.status.status(&wallet).await?;
    Ok(Json(report.into()))
}

/// POST /api/v1/premium/unlink
async fn unlink(
    State(state): State<AppState>,
    payload: Result<Json<WalletRequest>, JsonRejection>,
) -> Result<Json<UnlinkResponse>, AppError> {
    let Json(request) = payload?;
    let wallet = parse_wallet(&request.wallet_address)?;

    let removed = state.engine.unlink(&wallet).await?;
    Ok(Json(UnlinkResponse {
        unlinked: removed.is_some(),
    }))
}

/// GET /api/v1/premium/history/{wallet_address}
///
/// Returns every binding the wallet has held, newest first.
async fn get_history(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<Json<HistoryResponse>, AppError> {
    let wallet = parse_wallet(&wallet_address)?;

    let bindings = state.engine.history(&wallet).await?;
    Ok(Json(HistoryResponse {
        wallet_address: wallet,
        bindings: bindings.into_iter().map(HistoryEntry::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_request_deserialization() {
        let json = r#"{
            "walletAddress": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "profileId": "0x01a4"
        }"#;

        let request: LinkRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.profile_id, "0x01a4");
        assert!(parse_wallet(&request.wallet_address).is_ok());
    }

    #[test]
    fn test_binding_response_serialization() {
        let binding = Binding::new_active(
            WalletAddress::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap(),
            ProfileId::parse("0x01a4").unwrap(),
        );
        let json = serde_json::to_value(BindingResponse::from(binding)).unwrap();

        assert_eq!(json["walletAddress"], "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        assert_eq!(json["profileId"], "0x01a4");
        assert_eq!(json["isActive"], true);
        assert!(json.get("linkedAt").is_some());
        assert!(json.get("deactivatedAt").is_none());
    }

    #[test]
    fn test_parse_wallet_reports_field() {
        let err = parse_wallet("0x12").unwrap_err();
        assert!(matches!(err, LinkError::Validation { field: "walletAddress", .. }));
    }

    #[test]
    fn test_parse_profile_reports_field() {
        let err = parse_profile("  ").unwrap_err();
        assert!(matches!(err, LinkError::Validation { field: "profileId", .. }));
    }

    #[test]
    fn test_profiles_response_omits_missing_linked_profile() {
        let response = ProfilesResponse {
            profiles: vec![],
            can_link: false,
            linked_profile: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"profiles":[],"canLink":false}"#);
    }
}
