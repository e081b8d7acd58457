//! Profiles reported by the ownership oracle.

use premium_link_types::{ProfileId, WalletAddress};
use serde::{Deserialize, Serialize};

/// A profile the oracle reports as owned by a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedProfile {
    /// External profile identifier.
    pub id: ProfileId,
    /// Human-readable handle, when the upstream provides one.
    pub handle: Option<String>,
    /// Wallet that owns the profile.
    pub owned_by: WalletAddress,
}

impl OwnedProfile {
    pub fn new(id: ProfileId, handle: Option<String>, owned_by: WalletAddress) -> Self {
        Self {
            id,
            handle,
            owned_by,
        }
    }
}
