// Wallet address parsing for premium profile linking
// Addresses are EVM-style: 0x followed by 40 hex digits, stored lowercase

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of hex digits after the `0x` prefix.
const ADDRESS_HEX_LEN: usize = 40;

/// Errors produced when parsing a wallet address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("wallet address is empty")]
    Empty,

    #[error("wallet address must start with 0x")]
    MissingPrefix,

    #[error("wallet address must have {expected} hex digits after 0x, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("wallet address contains non-hex character {character:?} at position {index}")]
    InvalidCharacter { character: char, index: usize },
}

/// A lowercase-normalized wallet address.
///
/// Two addresses that differ only in letter case (for example an EIP-55
/// checksummed form and its lowercase form) parse to the same value, so the
/// wrapped string can be compared and used as a storage key directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parses and normalizes a wallet address.
    ///
    /// Surrounding whitespace is ignored. The `0x` prefix may be written in
    /// either case.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or(AddressError::MissingPrefix)?;

        // Positions below are character positions in the trimmed input.
        if let Some((index, character)) = body.chars().enumerate().find(|(_, c)| !c.is_ascii()) {
            return Err(AddressError::InvalidCharacter {
                character,
                index: index + 2,
            });
        }

        let actual = body.len();
        if actual != ADDRESS_HEX_LEN {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_HEX_LEN,
                actual,
            });
        }

        hex::decode(body).map_err(|e| match e {
            hex::FromHexError::InvalidHexCharacter { c, index } => AddressError::InvalidCharacter {
                character: c,
                // +2 for the prefix so the index points into the original input
                index: index + 2,
            },
            // Length was checked above; odd length cannot occur for 40 chars.
            _ => AddressError::InvalidLength {
                expected: ADDRESS_HEX_LEN,
                actual,
            },
        })?;

        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    /// Returns the normalized address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.0
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
