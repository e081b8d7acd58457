//! Binding model linking a wallet to a premium profile.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use premium_link_types::{ProfileId, WalletAddress};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a binding stopped being active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeactivationReason {
    /// The wallet linked a different profile.
    Relinked,
    /// The wallet owner removed the link.
    Unlinked,
    /// An administrator revoked the profile's link.
    Revoked,
}

impl DeactivationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeactivationReason::Relinked => "relinked",
            DeactivationReason::Unlinked => "unlinked",
            DeactivationReason::Revoked => "revoked",
        }
    }
}

impl fmt::Display for DeactivationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeactivationReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relinked" => Ok(DeactivationReason::Relinked),
            "unlinked" => Ok(DeactivationReason::Unlinked),
            "revoked" => Ok(DeactivationReason::Revoked),
            other => Err(format!("unknown deactivation reason: {}", other)),
        }
    }
}

/// Represents a binding between a wallet and a premium profile.
///
/// Bindings are never deleted. Once deactivated, the row stays as part of
/// the wallet's audit trail and is never reactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    /// Unique identifier for this binding record.
    pub id: Uuid,
    /// Wallet that holds the binding (lowercase).
    pub wallet_address: WalletAddress,
    /// Profile bound to the wallet.
    pub profile_id: ProfileId,
    /// Only active bindings take part in uniqueness checks.
    pub is_active: bool,
    /// When this binding was created.
    pub linked_at: DateTime<Utc>,
    /// When this binding was deactivated (null if still active).
    pub deactivated_at: Option<DateTime<Utc>>,
    /// Why this binding was deactivated (null if still active).
    pub deactivation_reason: Option<DeactivationReason>,
}

impl Binding {
    /// Creates a new active binding stamped with the current time.
    pub fn new_active(wallet_address: WalletAddress, profile_id: ProfileId) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_address,
            profile_id,
            is_active: true,
            linked_at: Utc::now(),
            deactivated_at: None,
            deactivation_reason: None,
        }
    }

    /// Returns true if this binding links `wallet` to `profile`.
    pub fn links(&self, wallet: &WalletAddress, profile: &ProfileId) -> bool {
        self.wallet_address == *wallet && self.profile_id == *profile
    }

    /// Marks the binding inactive. Has no effect on an already inactive binding.
    pub fn deactivate(&mut self, reason: DeactivationReason, at: DateTime<Utc>) {
        if !self.is_active {
            return;
        }
        self.is_active = false;
        self.deactivated_at = Some(at);
        self.deactivation_reason = Some(reason);
    }
}
