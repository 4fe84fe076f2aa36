use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

const PREFIX: &str = "0x";
const HEX_DIGITS: usize = 40;

/// An account address on the ledger.
///
/// Addresses are `0x`-prefixed, 40 hex digit strings. They are normalized to
/// lowercase when parsed so that differently cased spellings of the same
/// account compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// The all-zero address. Mints are transfers from it and burns are
    /// transfers to it, so it never identifies a participant.
    pub fn zero() -> Self {
        Self(format!("{PREFIX}{}", "0".repeat(HEX_DIGITS)))
    }

    /// Whether this is the all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0[PREFIX.len()..].bytes().all(|byte| byte == b'0')
    }

    /// The normalized textual form of the address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reasons an address string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The string does not start with `0x`
    #[error("Address {0:?} is missing the 0x prefix")]
    MissingPrefix(String),

    /// The string has the wrong number of hex digits
    #[error("Address {address:?} has {actual} hex digits, expected {HEX_DIGITS}")]
    InvalidLength {
        /// The rejected input
        address: String,
        /// Number of digits found after the prefix
        actual: usize,
    },

    /// The string contains something other than hex digits after the prefix
    #[error("Address {address:?} contains non-hex character {character:?}")]
    InvalidCharacter {
        /// The rejected input
        address: String,
        /// The first offending character
        character: char,
    },
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let digits = value
            .strip_prefix(PREFIX)
            .or_else(|| value.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(value.to_string()))?;

        if let Some(character) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidCharacter {
                address: value.to_string(),
                character,
            });
        }

        if digits.len() != HEX_DIGITS {
            return Err(AddressError::InvalidLength {
                address: value.to_string(),
                actual: digits.len(),
            });
        }

        Ok(Self(format!("{PREFIX}{}", digits.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
