// Membership status derived from a wallet's bindings

use std::fmt;

use serde::{Deserialize, Serialize};

/// Premium membership status of a wallet.
///
/// The status is never stored. It is computed on demand from the binding
/// registry and the wallet's current on-chain profile ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserStatus {
    /// No active binding and no unclaimed owned profile.
    Standard,
    /// No active binding, but at least one owned profile could be linked.
    OnChainUnlinked,
    /// The wallet has an active binding to a premium profile.
    ProLinked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Standard => "Standard",
            UserStatus::OnChainUnlinked => "OnChainUnlinked",
            UserStatus::ProLinked => "ProLinked",
        }
    }

    /// Returns true if the wallet currently holds premium membership.
    pub fn is_premium(&self) -> bool {
        matches!(self, UserStatus::ProLinked)
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
