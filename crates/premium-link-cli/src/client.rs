//! Blocking HTTP client for the premium link API.

use std::time::Duration;

use premium_link_types::{ProfileId, UserStatus, WalletAddress};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const API_PREFIX: &str = "/api/v1/premium";

/// A binding as returned by link and auto-link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingInfo {
    pub id: String,
    pub wallet_address: WalletAddress,
    pub profile_id: ProfileId,
    pub is_active: bool,
    pub linked_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedProfile {
    pub profile_id: ProfileId,
    pub linked_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub user_status: UserStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_profile: Option<LinkedProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInfo {
    pub id: ProfileId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub owned_by: WalletAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilesInfo {
    pub profiles: Vec<ProfileInfo>,
    pub can_link: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_profile: Option<LinkedProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlinkInfo {
    pub unlinked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub profile_id: ProfileId,
    pub is_active: bool,
    pub linked_at: String,
    #[serde(default)]
    pub deactivated_at: Option<String>,
    #[serde(default)]
    pub deactivation_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryInfo {
    pub wallet_address: WalletAddress,
    pub bindings: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeInfo {
    pub revoked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<WalletAddress>,
}

/// Error body returned by the server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    field: Option<String>,
}

/// Client for one premium link server.
pub struct PremiumClient {
    agent: ureq::Agent,
    base_url: String,
}

impl PremiumClient {
    pub fn new(base_url: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    pub fn status(&self, wallet: &WalletAddress) -> anyhow::Result<StatusInfo> {
        self.post("/status", json!({ "walletAddress": wallet }), None)
    }

    pub fn profiles(&self, wallet: &WalletAddress) -> anyhow::Result<ProfilesInfo> {
        self.post("/profiles", json!({ "walletAddress": wallet }), None)
    }

    pub fn link(&self, wallet: &WalletAddress, profile: &ProfileId) -> anyhow::Result<BindingInfo> {
        self.post(
            "/link",
            json!({ "walletAddress": wallet, "profileId": profile }),
            None,
        )
    }

    pub fn auto_link(&self, wallet: &WalletAddress) -> anyhow::Result<BindingInfo> {
        self.post("/auto-link", json!({ "walletAddress": wallet }), None)
    }

    pub fn unlink(&self, wallet: &WalletAddress) -> anyhow::Result<UnlinkInfo> {
        self.post("/unlink", json!({ "walletAddress": wallet }), None)
    }

    pub fn history(&self, wallet: &WalletAddress) -> anyhow::Result<HistoryInfo> {
        let response = self.agent.get(&self.url(&format!("/history/{}", wallet))).call();
        read_response(response)
    }

    pub fn revoke(&self, profile: &ProfileId, admin_token: &str) -> anyhow::Result<RevokeInfo> {
        self.post(
            "/admin/revoke",
            json!({ "profileId": profile }),
            Some(admin_token),
        )
    }

    fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
        bearer: Option<&str>,
    ) -> anyhow::Result<T> {
        let mut request = self.agent.post(&self.url(path));
        if let Some(token) = bearer {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }
        read_response(request.send_json(body))
    }
}

fn read_response<T: DeserializeOwned>(
    result: Result<ureq::Response, ureq::Error>,
) -> anyhow::Result<T> {
    match result {
        Ok(response) => response
            .into_json::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse server response: {}", e)),
        Err(ureq::Error::Status(code, response)) => {
            let body = response.into_string().unwrap_or_default();
            Err(api_error(code, &body))
        }
        Err(ureq::Error::Transport(e)) => Err(anyhow::anyhow!("Failed to reach server: {}", e)),
    }
}

/// Builds a readable error from a non-2xx response.
fn api_error(code: u16, body: &str) -> anyhow::Error {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error,
            field: Some(field),
        }) => anyhow::anyhow!("{} (field: {}, HTTP {})", error, field, code),
        Ok(ErrorBody { error, field: None }) => anyhow::anyhow!("{} (HTTP {})", error, code),
        Err(_) if body.trim().is_empty() => anyhow::anyhow!("Server returned HTTP {}", code),
        Err(_) => anyhow::anyhow!("Server returned HTTP {}: {}", code, body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_prefix() {
        let client = PremiumClient::new("http://localhost:3000/");
        assert_eq!(
            client.url("/status"),
            "http://localhost:3000/api/v1/premium/status"
        );
    }

    #[test]
    fn test_api_error_uses_server_message() {
        let err = api_error(409, r#"{"error":"Profile is already linked to another wallet"}"#);
        assert_eq!(
            err.to_string(),
            "Profile is already linked to another wallet (HTTP 409)"
        );
    }

    #[test]
    fn test_api_error_includes_field() {
        let err = api_error(400, r#"{"error":"Invalid walletAddress: too short","field":"walletAddress"}"#);
        assert!(err.to_string().contains("field: walletAddress"));
    }

    #[test]
    fn test_api_error_without_json_body() {
        assert_eq!(api_error(502, "").to_string(), "Server returned HTTP 502");
        assert_eq!(
            api_error(500, "oops\n").to_string(),
            "Server returned HTTP 500: oops"
        );
    }

    #[test]
    fn test_status_deserialization() {
        let info: StatusInfo = serde_json::from_str(
            r#"{"userStatus":"ProLinked","linkedProfile":{"profileId":"0x01","linkedAt":"2026-01-01T00:00:00Z"}}"#,
        )
        .unwrap();
        assert_eq!(info.user_status, UserStatus::ProLinked);
        assert_eq!(info.linked_profile.unwrap().profile_id.as_str(), "0x01");

        let info: StatusInfo = serde_json::from_str(r#"{"userStatus":"Standard"}"#).unwrap();
        assert!(info.linked_profile.is_none());
    }

    #[test]
    fn test_history_deserialization() {
        let info: HistoryInfo = serde_json::from_str(
            r#"{
                "walletAddress": "0x1111111111111111111111111111111111111111",
                "bindings": [{
                    "id": "5f0c6f5e-8a7c-4a53-9a57-2f7f0d0a9c11",
                    "profileId": "P1",
                    "isActive": false,
                    "linkedAt": "2026-01-01T00:00:00Z",
                    "deactivatedAt": "2026-01-02T00:00:00Z",
                    "deactivationReason": "relinked"
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(info.bindings.len(), 1);
        assert_eq!(info.bindings[0].deactivation_reason.as_deref(), Some("relinked"));
    }
}
