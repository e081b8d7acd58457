//! Deterministic in-process ownership oracle.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use premium_link_types::{ProfileId, WalletAddress};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{OracleError, OwnershipOracle};
use crate::models::OwnedProfile;

/// Fixture entry for one owned profile.
#[derive(Debug, Deserialize)]
struct FixtureProfile {
    id: ProfileId,
    #[serde(default)]
    handle: Option<String>,
}

/// Ownership oracle answering from a fixed table.
///
/// Answers can be changed at runtime to simulate transfers, and the oracle
/// can be switched into a failing or slow mode to exercise upstream error
/// handling.
#[derive(Debug, Default)]
pub struct FixedOwnershipOracle {
    owned: RwLock<HashMap<WalletAddress, Vec<OwnedProfile>>>,
    failure: RwLock<Option<OracleError>>,
    delay: RwLock<Option<Duration>>,
}

impl FixedOwnershipOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a table from JSON of the form
    /// `{ "<wallet>": [{ "id": "<profile>", "handle": "<handle>" }] }`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let table: HashMap<WalletAddress, Vec<FixtureProfile>> = serde_json::from_str(json)?;
        let owned = table
            .into_iter()
            .map(|(wallet, profiles)| {
                let profiles = profiles
                    .into_iter()
                    .map(|p| OwnedProfile::new(p.id, p.handle, wallet.clone()))
                    .collect();
                (wallet, profiles)
            })
            .collect();

        Ok(Self {
            owned: RwLock::new(owned),
            ..Self::default()
        })
    }

    /// Builder form of [`set_owned`](Self::set_owned).
    pub fn with_owned(mut self, wallet: &WalletAddress, profiles: &[&str]) -> Self {
        self.owned
            .get_mut()
            .insert(wallet.clone(), make_profiles(wallet, profiles));
        self
    }

    /// Replaces the profiles reported for `wallet`, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if a profile id is invalid; fixtures are expected to be valid.
    pub async fn set_owned(&self, wallet: &WalletAddress, profiles: &[&str]) {
        self.owned
            .write()
            .await
            .insert(wallet.clone(), make_profiles(wallet, profiles));
    }

    /// Makes every lookup fail with `error` until cleared with `None`.
    pub async fn set_failure(&self, error: Option<OracleError>) {
        *self.failure.write().await = error;
    }

    /// Delays every lookup by `delay`.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().await = delay;
    }
}

fn make_profiles(wallet: &WalletAddress, profiles: &[&str]) -> Vec<OwnedProfile> {
    profiles
        .iter()
        .map(|id| {
            let id = ProfileId::parse(id).expect("fixture profile id must be valid");
            OwnedProfile::new(id, None, wallet.clone())
        })
        .collect()
}

#[async_trait]
impl OwnershipOracle for FixedOwnershipOracle {
    async fn profiles_owned_by(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<OwnedProfile>, OracleError> {
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failure.read().await.clone() {
            return Err(error);
        }

        Ok(self
            .owned
            .read()
            .await
            .get(wallet)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap()
    }

    #[tokio::test]
    async fn test_unknown_wallet_owns_nothing() {
        let oracle = FixedOwnershipOracle::new();
        assert!(oracle.profiles_owned_by(&wallet()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_with_owned_preserves_order() {
        let oracle = FixedOwnershipOracle::new().with_owned(&wallet(), &["p2", "p1"]);
        let profiles = oracle.profiles_owned_by(&wallet()).await.unwrap();
        let ids: Vec<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p1"]);
        assert!(profiles.iter().all(|p| p.owned_by == wallet()));
    }

    #[tokio::test]
    async fn test_failure_mode() {
        let oracle = FixedOwnershipOracle::new().with_owned(&wallet(), &["p1"]);
        oracle.set_failure(Some(OracleError::Status(500))).await;
        assert_eq!(
            oracle.profiles_owned_by(&wallet()).await,
            Err(OracleError::Status(500))
        );

        oracle.set_failure(None).await;
        assert_eq!(oracle.profiles_owned_by(&wallet()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_from_json() {
        let oracle = FixedOwnershipOracle::from_json(
            r#"{
                "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed": [
                    { "id": "0x01", "handle": "alice.lens" },
                    { "id": "0x02" }
                ]
            }"#,
        )
        .unwrap();

        let profiles = oracle.profiles_owned_by(&wallet()).await.unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].handle.as_deref(), Some("alice.lens"));
        assert_eq!(profiles[1].owned_by, wallet());
    }

    #[tokio::test]
    async fn test_dev_fixture_loads() {
        let oracle =
            FixedOwnershipOracle::from_json(include_str!("../../../../fixtures/dev_ownership.json"))
                .unwrap();
        let owned = oracle.profiles_owned_by(&wallet_n(1)).await.unwrap();
        assert_eq!(owned.len(), 2);
        assert!(oracle.profiles_owned_by(&wallet_n(3)).await.unwrap().is_empty());
    }

    fn wallet_n(n: u8) -> WalletAddress {
        WalletAddress::parse(&format!("0x{}", format!("{:x}", n % 16).repeat(40))).unwrap()
    }

    #[test]
    fn test_from_json_rejects_bad_wallet() {
        assert!(FixedOwnershipOracle::from_json(r#"{ "alice": [] }"#).is_err());
    }
}
