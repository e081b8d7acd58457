//! Linking engine: verified creation and removal of premium bindings.

use std::sync::Arc;

use premium_link_types::{ProfileId, WalletAddress};

use crate::eligibility::ProfileEligibilityResolver;
use crate::error::{LinkError, NO_ELIGIBLE_PROFILE_MESSAGE};
use crate::models::Binding;
use crate::registry::LinkRegistry;

/// Outcome of an auto-link attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoLinkOutcome {
    Linked(Binding),
    NoEligibleProfile,
}

impl AutoLinkOutcome {
    /// Converts a missing profile into [`LinkError::NotFound`].
    pub fn into_result(self) -> Result<Binding, LinkError> {
        match self {
            AutoLinkOutcome::Linked(binding) => Ok(binding),
            AutoLinkOutcome::NoEligibleProfile => {
                Err(LinkError::NotFound(NO_ELIGIBLE_PROFILE_MESSAGE.to_string()))
            }
        }
    }
}

/// Verifies ownership and creates bindings through the registry.
#[derive(Clone)]
pub struct LinkingEngine {
    eligibility: ProfileEligibilityResolver,
    registry: Arc<dyn LinkRegistry>,
}

impl LinkingEngine {
    pub fn new(eligibility: ProfileEligibilityResolver, registry: Arc<dyn LinkRegistry>) -> Self {
        Self {
            eligibility,
            registry,
        }
    }

    /// Links `wallet` to `profile` after checking the wallet owns it.
    ///
    /// Relinking to a different profile deactivates the previous binding.
    /// Linking to the profile the wallet already holds returns the existing
    /// binding.
    pub async fn link_profile(
        &self,
        wallet: &WalletAddress,
        profile: &ProfileId,
    ) -> Result<Binding, LinkError> {
        let eligibility = self.eligibility.eligible_profiles(wallet).await?;

        if !eligibility.owns(profile) {
            tracing::info!(wallet = %wallet, profile_id = %profile, "Rejected link to unowned profile");
            return Err(LinkError::Ownership);
        }

        if let Some(current) = &eligibility.current_binding {
            if current.profile_id == *profile {
                return Ok(current.clone());
            }
        }

        if !eligibility.profiles.iter().any(|p| p.id == *profile) {
            tracing::info!(wallet = %wallet, profile_id = %profile, "Profile already linked elsewhere");
            return Err(LinkError::Conflict);
        }

        let binding = self.registry.create_binding(wallet, profile).await?;

        tracing::info!(
            wallet = %wallet,
            profile_id = %profile,
            binding_id = %binding.id,
            "Premium profile linked"
        );

        Ok(binding)
    }

    /// Links the wallet's first eligible profile, in oracle order.
    ///
    /// The wallet's own bound profile counts as eligible, so a wallet already
    /// bound to the first profile gets its existing binding back and a wallet
    /// bound to a later one is relinked.
    pub async fn auto_link_first_profile(
        &self,
        wallet: &WalletAddress,
    ) -> Result<AutoLinkOutcome, LinkError> {
        let eligibility = self.eligibility.eligible_profiles(wallet).await?;

        let Some(first) = eligibility.profiles.first() else {
            tracing::debug!(wallet = %wallet, "No eligible profile to auto-link");
            return Ok(AutoLinkOutcome::NoEligibleProfile);
        };

        self.link_profile(wallet, &first.id)
            .await
            .map(AutoLinkOutcome::Linked)
    }

    /// Removes the wallet's active binding, if any.
    pub async fn unlink(&self, wallet: &WalletAddress) -> Result<Option<Binding>, LinkError> {
        let removed = self.registry.deactivate_binding(wallet).await?;
        if let Some(binding) = &removed {
            tracing::info!(
                wallet = %wallet,
                profile_id = %binding.profile_id,
                binding_id = %binding.id,
                "Premium profile unlinked"
            );
        }
        Ok(removed)
    }

    /// Administratively revokes whatever binding holds `profile`.
    pub async fn revoke_profile(&self, profile: &ProfileId) -> Result<Option<Binding>, LinkError> {
        let revoked = self.registry.deactivate_binding_for_profile(profile).await?;
        if let Some(binding) = &revoked {
            tracing::warn!(
                wallet = %binding.wallet_address,
                profile_id = %profile,
                binding_id = %binding.id,
                "Premium binding revoked"
            );
        }
        Ok(revoked)
    }

    /// Returns every binding the wallet has held, newest first.
    pub async fn history(&self, wallet: &WalletAddress) -> Result<Vec<Binding>, LinkError> {
        self.registry.binding_history(wallet).await
    }
}
