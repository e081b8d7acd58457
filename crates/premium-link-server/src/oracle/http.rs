//! HTTP adapter for the upstream profile ownership API.

use std::time::Duration;

use async_trait::async_trait;
use premium_link_types::{ProfileId, WalletAddress};
use reqwest::Client;
use serde::Deserialize;

use super::{OracleError, OwnershipOracle};
use crate::models::OwnedProfile;

/// Response body of `GET /profiles?ownedBy=<wallet>`.
#[derive(Debug, Deserialize)]
struct ProfilesResponse {
    items: Vec<ProfileItem>,
}

/// A single profile entry in the upstream response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileItem {
    id: String,
    #[serde(default)]
    handle: Option<String>,
    owned_by: String,
}

impl ProfileItem {
    fn into_owned_profile(self) -> Result<OwnedProfile, OracleError> {
        let id = ProfileId::parse(&self.id)
            .map_err(|e| OracleError::Malformed(format!("profile id {:?}: {}", self.id, e)))?;
        let owned_by = WalletAddress::parse(&self.owned_by).map_err(|e| {
            OracleError::Malformed(format!("owner of profile {}: {}", id, e))
        })?;
        Ok(OwnedProfile::new(id, self.handle, owned_by))
    }
}

/// Ownership oracle that queries the upstream profile API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpOwnershipOracle {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpOwnershipOracle {
    /// Creates a client for the API at `base_url`.
    ///
    /// `timeout` bounds each request end to end.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }

    fn profiles_url(&self) -> String {
        format!("{}/profiles", self.base_url)
    }

    /// Maps a reqwest error to `Timeout` if the request deadline passed,
    /// otherwise to `other`. The deadline covers reading the body too.
    fn request_error(&self, e: reqwest::Error, other: fn(String) -> OracleError) -> OracleError {
        if e.is_timeout() {
            OracleError::Timeout(self.timeout)
        } else {
            other(e.to_string())
        }
    }
}

#[async_trait]
impl OwnershipOracle for HttpOwnershipOracle {
    async fn profiles_owned_by(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<OwnedProfile>, OracleError> {
        let mut request = self
            .client
            .get(self.profiles_url())
            .query(&[("ownedBy", wallet.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.request_error(e, OracleError::Transport))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        let body: ProfilesResponse = response
            .json()
            .await
            .map_err(|e| self.request_error(e, OracleError::Malformed))?;

        body.items
            .into_iter()
            .map(ProfileItem::into_owned_profile)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    const OWNER: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

    /// Serves `router` on an ephemeral local port and returns its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn oracle(base_url: String) -> HttpOwnershipOracle {
        HttpOwnershipOracle::new(base_url, None, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_parses_profiles_in_upstream_order() {
        let router = Router::new().route(
            "/profiles",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let owner = params.get("ownedBy").cloned().unwrap_or_default();
                Json(json!({
                    "items": [
                        { "id": "0x02", "handle": "bob.lens", "ownedBy": owner },
                        { "id": "0x01", "ownedBy": owner }
                    ]
                }))
            }),
        );
        let base = serve(router).await;

        let wallet = WalletAddress::parse(OWNER).unwrap();
        let profiles = oracle(base).profiles_owned_by(&wallet).await.unwrap();

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].id.as_str(), "0x02");
        assert_eq!(profiles[0].handle.as_deref(), Some("bob.lens"));
        assert_eq!(profiles[1].id.as_str(), "0x01");
        assert_eq!(profiles[1].owned_by, wallet);
    }

    #[tokio::test]
    async fn test_empty_items_is_empty_list() {
        let router = Router::new().route("/profiles", get(|| async { Json(json!({ "items": [] })) }));
        let base = serve(router).await;

        let wallet = WalletAddress::parse(OWNER).unwrap();
        let profiles = oracle(base).profiles_owned_by(&wallet).await.unwrap();
        assert!(profiles.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_not_empty_list() {
        let router = Router::new().route(
            "/profiles",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let base = serve(router).await;

        let wallet = WalletAddress::parse(OWNER).unwrap();
        let result = oracle(base).profiles_owned_by(&wallet).await;
        assert_eq!(result, Err(OracleError::Status(503)));
    }

    #[tokio::test]
    async fn test_unparsable_body_is_malformed() {
        let router = Router::new().route(
            "/profiles",
            get(|| async { Json(json!({ "data": { "profiles": [] } })) }),
        );
        let base = serve(router).await;

        let wallet = WalletAddress::parse(OWNER).unwrap();
        let result = oracle(base).profiles_owned_by(&wallet).await;
        assert!(matches!(result, Err(OracleError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_invalid_owner_is_malformed() {
        let router = Router::new().route(
            "/profiles",
            get(|| async {
                Json::<Value>(json!({ "items": [{ "id": "0x01", "ownedBy": "nobody" }] }))
            }),
        );
        let base = serve(router).await;

        let wallet = WalletAddress::parse(OWNER).unwrap();
        let result = oracle(base).profiles_owned_by(&wallet).await;
        assert!(matches!(result, Err(OracleError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_stalled_body_is_timeout() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Headers arrive promptly, the body never completes.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\n\
                      Content-Type: application/json\r\n\
                      Content-Length: 64\r\n\r\n\
                      {\"items\":[",
                )
                .await;
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let timeout = Duration::from_millis(200);
        let oracle = HttpOwnershipOracle::new(format!("http://{}", addr), None, timeout).unwrap();
        let wallet = WalletAddress::parse(OWNER).unwrap();

        let result = oracle.profiles_owned_by(&wallet).await;
        assert_eq!(result, Err(OracleError::Timeout(timeout)));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let wallet = WalletAddress::parse(OWNER).unwrap();
        let result = oracle(format!("http://{}", addr))
            .profiles_owned_by(&wallet)
            .await;
        assert!(matches!(result, Err(OracleError::Transport(_))));
    }

    #[tokio::test]
    async fn test_sends_bearer_token() {
        let router = Router::new().route(
            "/profiles",
            get(|headers: axum::http::HeaderMap| async move {
                match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                    Some("Bearer secret") => (StatusCode::OK, Json(json!({ "items": [] }))),
                    _ => (StatusCode::UNAUTHORIZED, Json(json!({}))),
                }
            }),
        );
        let base = serve(router).await;

        let wallet = WalletAddress::parse(OWNER).unwrap();
        let with_key = HttpOwnershipOracle::new(
            base.clone(),
            Some("secret".to_string()),
            Duration::from_secs(2),
        )
        .unwrap();
        assert!(with_key.profiles_owned_by(&wallet).await.is_ok());
        assert_eq!(
            oracle(base).profiles_owned_by(&wallet).await,
            Err(OracleError::Status(401))
        );
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let oracle =
            HttpOwnershipOracle::new("http://oracle.local/api/", None, Duration::from_secs(1))
                .unwrap();
        assert_eq!(oracle.profiles_url(), "http://oracle.local/api/profiles");
    }
}
