//! Link registry: the only writer of wallet/profile bindings.
//!
//! Every implementation upholds two invariants at all times:
//! at most one active binding per wallet, and at most one active binding per
//! profile. `create_binding` re-checks both inside its own transaction;
//! results of earlier reads are never trusted for a write.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use premium_link_types::{ProfileId, WalletAddress};

use crate::error::LinkError;
use crate::models::Binding;

pub use memory::MemoryLinkRegistry;
pub use postgres::PgLinkRegistry;

/// Persisted store of wallet/profile bindings.
#[async_trait]
pub trait LinkRegistry: Send + Sync {
    /// Returns the wallet's active binding, if any.
    async fn active_binding_by_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Option<Binding>, LinkError>;

    /// Returns the profile's active binding, if any.
    async fn active_binding_by_profile(
        &self,
        profile: &ProfileId,
    ) -> Result<Option<Binding>, LinkError>;

    /// Returns the active bindings of every listed profile that has one.
    async fn active_bindings_for_profiles(
        &self,
        profiles: &[ProfileId],
    ) -> Result<Vec<Binding>, LinkError>;

    /// Atomically binds `wallet` to `profile`.
    ///
    /// Any other active binding held by `wallet` is deactivated in the same
    /// transaction. Fails with [`LinkError::Conflict`] if `profile` is
    /// actively bound to a different wallet. If `wallet` is already bound to
    /// `profile` the existing binding is returned unchanged.
    async fn create_binding(
        &self,
        wallet: &WalletAddress,
        profile: &ProfileId,
    ) -> Result<Binding, LinkError>;

    /// Deactivates the wallet's active binding. Returns `None` if there was none.
    async fn deactivate_binding(&self, wallet: &WalletAddress)
        -> Result<Option<Binding>, LinkError>;

    /// Deactivates the profile's active binding (administrative revoke).
    /// Returns `None` if there was none.
    async fn deactivate_binding_for_profile(
        &self,
        profile: &ProfileId,
    ) -> Result<Option<Binding>, LinkError>;

    /// Returns every binding the wallet has held, newest first.
    async fn binding_history(&self, wallet: &WalletAddress) -> Result<Vec<Binding>, LinkError>;
}
