//! Profile eligibility: which owned profiles a wallet may link.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use premium_link_types::{ProfileId, WalletAddress};

use crate::error::LinkError;
use crate::models::{Binding, OwnedProfile};
use crate::oracle::{OracleError, OwnershipOracle};
use crate::registry::LinkRegistry;

/// Default bound on a single ownership lookup.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of an eligibility check for one wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    /// Every profile the oracle attributes to the wallet, deduplicated, in oracle order.
    pub owned: Vec<OwnedProfile>,
    /// Owned profiles not actively bound to a different wallet.
    pub profiles: Vec<OwnedProfile>,
    /// True when the wallet has no binding and some owned profile is unclaimed.
    pub can_link: bool,
    /// The wallet's active binding, if any.
    pub current_binding: Option<Binding>,
}

impl Eligibility {
    /// Returns true if the oracle attributes `profile` to the wallet.
    pub fn owns(&self, profile: &ProfileId) -> bool {
        self.owned.iter().any(|p| p.id == *profile)
    }
}

/// Computes linkable profiles from the oracle and the registry.
#[derive(Clone)]
pub struct ProfileEligibilityResolver {
    oracle: Arc<dyn OwnershipOracle>,
    registry: Arc<dyn LinkRegistry>,
    oracle_timeout: Duration,
}

impl ProfileEligibilityResolver {
    pub fn new(
        oracle: Arc<dyn OwnershipOracle>,
        registry: Arc<dyn LinkRegistry>,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            registry,
            oracle_timeout,
        }
    }

    /// Computes the wallet's eligibility.
    ///
    /// The oracle is queried first, outside of any registry transaction.
    /// An oracle failure is returned as [`LinkError::Upstream`]; it is never
    /// treated as "owns nothing".
    pub async fn eligible_profiles(&self, wallet: &WalletAddress) -> Result<Eligibility, LinkError> {
        let owned = self.owned_profiles(wallet).await?;

        let current_binding = self.registry.active_binding_by_wallet(wallet).await?;

        let ids: Vec<ProfileId> = owned.iter().map(|p| p.id.clone()).collect();
        let holders: HashMap<ProfileId, WalletAddress> = self
            .registry
            .active_bindings_for_profiles(&ids)
            .await?
            .into_iter()
            .map(|b| (b.profile_id, b.wallet_address))
            .collect();

        let profiles: Vec<OwnedProfile> = owned
            .iter()
            .filter(|p| holders.get(&p.id).map_or(true, |holder| holder == wallet))
            .cloned()
            .collect();

        let has_unclaimed = owned.iter().any(|p| !holders.contains_key(&p.id));
        let can_link = current_binding.is_none() && has_unclaimed;

        Ok(Eligibility {
            owned,
            profiles,
            can_link,
            current_binding,
        })
    }

    /// Queries the oracle under the configured timeout and cleans up its answer.
    async fn owned_profiles(&self, wallet: &WalletAddress) -> Result<Vec<OwnedProfile>, LinkError> {
        let lookup = self.oracle.profiles_owned_by(wallet);
        let reported = match tokio::time::timeout(self.oracle_timeout, lookup).await {
            Ok(Ok(profiles)) => profiles,
            Ok(Err(e)) => return Err(upstream(wallet, e)),
            Err(_) => return Err(upstream(wallet, OracleError::Timeout(self.oracle_timeout))),
        };

        let mut seen = HashSet::new();
        let mut owned = Vec::with_capacity(reported.len());
        for profile in reported {
            if profile.owned_by != *wallet {
                tracing::warn!(
                    wallet = %wallet,
                    profile_id = %profile.id,
                    reported_owner = %profile.owned_by,
                    "Oracle returned a profile owned by a different wallet, ignoring it"
                );
                continue;
            }
            if seen.insert(profile.id.clone()) {
                owned.push(profile);
            }
        }

        Ok(owned)
    }
}

fn upstream(wallet: &WalletAddress, err: OracleError) -> LinkError {
    tracing::warn!(wallet = %wallet, error = %err, "Ownership lookup failed");
    LinkError::Upstream(err.to_string())
}
