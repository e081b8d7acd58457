//! Ownership oracle: the external authority on which profiles a wallet owns.
//!
//! The core only sees the [`OwnershipOracle`] capability. `http` talks to the
//! upstream profile API; `fixed` is a deterministic in-process table used by
//! tests and local development.

pub mod fixed;
pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use premium_link_types::WalletAddress;

use crate::models::OwnedProfile;

pub use fixed::FixedOwnershipOracle;
pub use http::HttpOwnershipOracle;

/// Errors from an ownership lookup. None of them mean "owns nothing".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Reports the profiles a wallet currently owns.
#[async_trait]
pub trait OwnershipOracle: Send + Sync {
    /// Returns the wallet's profiles in the upstream's order.
    ///
    /// An empty list means the upstream positively reported no ownership.
    async fn profiles_owned_by(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<OwnedProfile>, OracleError>;
}
