// Opaque external profile identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum accepted length of a profile identifier, in bytes.
pub const MAX_PROFILE_ID_LEN: usize = 128;

/// Errors produced when parsing a profile identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileIdError {
    #[error("profile id is empty")]
    Empty,

    #[error("profile id exceeds {max} bytes")]
    TooLong { max: usize },

    #[error("profile id contains whitespace or control characters")]
    InvalidCharacter,
}

/// Identifier of a profile on the external identity network.
///
/// The value is opaque: it is trimmed and checked for obviously malformed
/// input, but its case and format are preserved as the upstream reports them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileId(String);

impl ProfileId {
    /// Parses a profile identifier.
    pub fn parse(input: &str) -> Result<Self, ProfileIdError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ProfileIdError::Empty);
        }
        if trimmed.len() > MAX_PROFILE_ID_LEN {
            return Err(ProfileIdError::TooLong {
                max: MAX_PROFILE_ID_LEN,
            });
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ProfileIdError::InvalidCharacter);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProfileId {
    type Err = ProfileIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProfileId {
    type Error = ProfileIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProfileId> for String {
    fn from(id: ProfileId) -> Self {
        id.0
    }
}

impl AsRef<str> for ProfileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
