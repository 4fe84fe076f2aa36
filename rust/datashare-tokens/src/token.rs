use std::fmt::{Display, Formatter};
use std::num::NonZeroU64;

use datashare_ledger::{Address, RegistryName};
use serde::{Deserialize, Serialize};

use crate::InvalidInput;

/// Identifier of an issued credential.
///
/// Registries answer `0` for identities that hold no token. That sentinel is
/// never a valid id, so a `TokenId` is non-zero by construction and the raw
/// zero never leaves this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(NonZeroU64);

impl TokenId {
    /// Wrap a raw registry id, treating `0` as "no token".
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// The raw registry id.
    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl From<TokenId> for u64 {
    fn from(token_id: TokenId) -> Self {
        token_id.get()
    }
}

impl Display for TokenId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The role a credential grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May contribute data
    Provider,
    /// May request data, within its access policies
    Analyzer,
}

impl Role {
    /// The registry issuing credentials for this role.
    pub fn registry(&self) -> RegistryName {
        match self {
            Role::Provider => RegistryName::DataProviders,
            Role::Analyzer => RegistryName::DataAnalyzers,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Provider => f.write_str("data provider"),
            Role::Analyzer => f.write_str("data analyzer"),
        }
    }
}

/// Parse an identity handed to the service, rejecting the reserved zero
/// address.
pub(crate) fn identity(field: &'static str, raw: &str) -> Result<Address, InvalidInput> {
    let address: Address = raw
        .parse()
        .map_err(|source| InvalidInput::MalformedAddress { field, source })?;

    if address.is_zero() {
        return Err(InvalidInput::ZeroAddress { field });
    }

    Ok(address)
}
