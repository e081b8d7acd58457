//! Membership status derivation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use premium_link_types::{ProfileId, UserStatus, WalletAddress};
use serde::{Deserialize, Serialize};

use crate::eligibility::ProfileEligibilityResolver;
use crate::error::LinkError;
use crate::models::Binding;
use crate::registry::LinkRegistry;

/// The profile a premium wallet is linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedProfile {
    pub profile_id: ProfileId,
    pub linked_at: DateTime<Utc>,
}

impl From<&Binding> for LinkedProfile {
    fn from(binding: &Binding) -> Self {
        Self {
            profile_id: binding.profile_id.clone(),
            linked_at: binding.linked_at,
        }
    }
}

/// Status of one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub user_status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_profile: Option<LinkedProfile>,
}

/// Derives [`UserStatus`] from the registry and profile eligibility.
///
/// Holds no state of its own and has no side effects.
#[derive(Clone)]
pub struct StatusResolver {
    eligibility: ProfileEligibilityResolver,
    registry: Arc<dyn LinkRegistry>,
}

impl StatusResolver {
    pub fn new(eligibility: ProfileEligibilityResolver, registry: Arc<dyn LinkRegistry>) -> Self {
        Self {
            eligibility,
            registry,
        }
    }

    pub async fn status(&self, wallet: &WalletAddress) -> Result<StatusReport, LinkError> {
        if let Some(binding) = self.registry.active_binding_by_wallet(wallet).await? {
            return Ok(StatusReport {
                user_status: UserStatus::ProLinked,
                linked_profile: Some(LinkedProfile::from(&binding)),
            });
        }

        let eligibility = self.eligibility.eligible_profiles(wallet).await?;

        // A binding created between the two reads wins.
        if let Some(binding) = &eligibility.current_binding {
            return Ok(StatusReport {
                user_status: UserStatus::ProLinked,
                linked_profile: Some(LinkedProfile::from(binding)),
            });
        }

        let user_status = if eligibility.can_link {
            UserStatus::OnChainUnlinked
        } else {
            UserStatus::Standard
        };

        Ok(StatusReport {
            user_status,
            linked_profile: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::DEFAULT_ORACLE_TIMEOUT;
    use crate::oracle::{FixedOwnershipOracle, OracleError};
    use crate::registry::MemoryLinkRegistry;

    fn wallet(n: u8) -> WalletAddress {
        WalletAddress::parse(&format!("0x{:040x}", n)).unwrap()
    }

    fn profile(id: &str) -> ProfileId {
        ProfileId::parse(id).unwrap()
    }

    fn setup(
        oracle: FixedOwnershipOracle,
    ) -> (StatusResolver, Arc<FixedOwnershipOracle>, Arc<MemoryLinkRegistry>) {
        let oracle = Arc::new(oracle);
        let registry = Arc::new(MemoryLinkRegistry::new());
        let eligibility =
            ProfileEligibilityResolver::new(oracle.clone(), registry.clone(), DEFAULT_ORACLE_TIMEOUT);
        (StatusResolver::new(eligibility, registry.clone()), oracle, registry)
    }

    #[tokio::test]
    async fn test_standard_when_owning_nothing() {
        let (resolver, _, _) = setup(FixedOwnershipOracle::new());
        let report = resolver.status(&wallet(3)).await.unwrap();
        assert_eq!(report.user_status, UserStatus::Standard);
        assert!(report.linked_profile.is_none());
    }

    #[tokio::test]
    async fn test_on_chain_unlinked_when_owning_unclaimed_profile() {
        let (resolver, _, _) = setup(FixedOwnershipOracle::new().with_owned(&wallet(1), &["p1"]));
        let report = resolver.status(&wallet(1)).await.unwrap();
        assert_eq!(report.user_status, UserStatus::OnChainUnlinked);
    }

    #[tokio::test]
    async fn test_standard_when_all_profiles_claimed_elsewhere() {
        let (resolver, _, registry) =
            setup(FixedOwnershipOracle::new().with_owned(&wallet(1), &["p1"]));
        registry.create_binding(&wallet(2), &profile("p1")).await.unwrap();

        let report = resolver.status(&wallet(1)).await.unwrap();
        assert_eq!(report.user_status, UserStatus::Standard);
    }

    #[tokio::test]
    async fn test_pro_linked_reports_profile() {
        let (resolver, _, registry) =
            setup(FixedOwnershipOracle::new().with_owned(&wallet(1), &["p1"]));
        let binding = registry.create_binding(&wallet(1), &profile("p1")).await.unwrap();

        let report = resolver.status(&wallet(1)).await.unwrap();
        assert_eq!(report.user_status, UserStatus::ProLinked);
        assert_eq!(
            report.linked_profile,
            Some(LinkedProfile {
                profile_id: profile("p1"),
                linked_at: binding.linked_at,
            })
        );
    }

    #[tokio::test]
    async fn test_pro_linked_does_not_need_oracle() {
        let (resolver, oracle, registry) =
            setup(FixedOwnershipOracle::new().with_owned(&wallet(1), &["p1"]));
        registry.create_binding(&wallet(1), &profile("p1")).await.unwrap();
        oracle.set_failure(Some(OracleError::Status(503))).await;

        let report = resolver.status(&wallet(1)).await.unwrap();
        assert_eq!(report.user_status, UserStatus::ProLinked);
    }

    #[tokio::test]
    async fn test_oracle_failure_is_not_standard() {
        let (resolver, oracle, _) =
            setup(FixedOwnershipOracle::new().with_owned(&wallet(1), &["p1"]));
        oracle.set_failure(Some(OracleError::Malformed("bad json".into()))).await;

        let result = resolver.status(&wallet(1)).await;
        assert!(matches!(result, Err(LinkError::Upstream(_))));
    }

    #[test]
    fn test_report_serialization() {
        let report = StatusReport {
            user_status: UserStatus::OnChainUnlinked,
            linked_profile: None,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"userStatus":"OnChainUnlinked"}"#);
    }
}
