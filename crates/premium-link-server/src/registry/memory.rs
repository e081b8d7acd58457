//! In-process link registry.
//!
//! A single mutex serializes every write, which gives the same
//! check-then-insert atomicity the Postgres registry gets from its
//! transaction locks. Used by tests and by the server's `--in-memory` mode.

use async_trait::async_trait;
use chrono::Utc;
use premium_link_types::{ProfileId, WalletAddress};
use tokio::sync::Mutex;

use super::LinkRegistry;
use crate::error::LinkError;
use crate::models::{Binding, DeactivationReason};

/// Link registry backed by a vector of bindings.
#[derive(Debug, Default)]
pub struct MemoryLinkRegistry {
    bindings: Mutex<Vec<Binding>>,
}

impl MemoryLinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every stored binding, active or not, in insertion order.
    pub async fn snapshot(&self) -> Vec<Binding> {
        self.bindings.lock().await.clone()
    }
}

#[async_trait]
impl LinkRegistry for MemoryLinkRegistry {
    async fn active_binding_by_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Option<Binding>, LinkError> {
        let bindings = self.bindings.lock().await;
        Ok(bindings
            .iter()
            .find(|b| b.is_active && b.wallet_address == *wallet)
            .cloned())
    }

    async fn active_binding_by_profile(
        &self,
        profile: &ProfileId,
    ) -> Result<Option<Binding>, LinkError> {
        let bindings = self.bindings.lock().await;
        Ok(bindings
            .iter()
            .find(|b| b.is_active && b.profile_id == *profile)
            .cloned())
    }

    async fn active_bindings_for_profiles(
        &self,
        profiles: &[ProfileId],
    ) -> Result<Vec<Binding>, LinkError> {
        let bindings = self.bindings.lock().await;
        Ok(bindings
            .iter()
            .filter(|b| b.is_active && profiles.contains(&b.profile_id))
            .cloned()
            .collect())
    }

    async fn create_binding(
        &self,
        wallet: &WalletAddress,
        profile: &ProfileId,
    ) -> Result<Binding, LinkError> {
        let mut bindings = self.bindings.lock().await;

        if let Some(existing) = bindings
            .iter()
            .find(|b| b.is_active && b.profile_id == *profile)
        {
            if existing.links(wallet, profile) {
                return Ok(existing.clone());
            }
            return Err(LinkError::Conflict);
        }

        let now = Utc::now();
        for binding in bindings
            .iter_mut()
            .filter(|b| b.is_active && b.wallet_address == *wallet)
        {
            binding.deactivate(DeactivationReason::Relinked, now);
        }

        let binding = Binding::new_active(wallet.clone(), profile.clone());
        bindings.push(binding.clone());

        Ok(binding)
    }

    async fn deactivate_binding(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Option<Binding>, LinkError> {
        let mut bindings = self.bindings.lock().await;
        Ok(bindings
            .iter_mut()
            .find(|b| b.is_active && b.wallet_address == *wallet)
            .map(|b| {
                b.deactivate(DeactivationReason::Unlinked, Utc::now());
                b.clone()
            }))
    }

    async fn deactivate_binding_for_profile(
        &self,
        profile: &ProfileId,
    ) -> Result<Option<Binding>, LinkError> {
        let mut bindings = self.bindings.lock().await;
        Ok(bindings
            .iter_mut()
            .find(|b| b.is_active && b.profile_id == *profile)
            .map(|b| {
                b.deactivate(DeactivationReason::Revoked, Utc::now());
                b.clone()
            }))
    }

    async fn binding_history(&self, wallet: &WalletAddress) -> Result<Vec<Binding>, LinkError> {
        let bindings = self.bindings.lock().await;
        // Insertion order is creation order; reverse for newest first.
        Ok(bindings
            .iter()
            .rev()
            .filter(|b| b.wallet_address == *wallet)
            .cloned()
            .collect())
    }
}
