use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// The registries hosted by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegistryName {
    /// Issues data provider tokens
    #[serde(rename = "DataProvidersRegistry", alias = "DataProvidersNFTs")]
    DataProviders,

    /// Issues data analyzer tokens and owns the access policy catalog
    #[serde(rename = "DataAnalyzersRegistry", alias = "DataAnalyzersNFTs")]
    DataAnalyzers,
}

impl RegistryName {
    /// Every registry the ledger hosts.
    pub const ALL: [RegistryName; 2] = [RegistryName::DataProviders, RegistryName::DataAnalyzers];

    /// The logical name of the registry.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryName::DataProviders => "DataProvidersRegistry",
            RegistryName::DataAnalyzers => "DataAnalyzersRegistry",
        }
    }

    /// The name of the contract deployed for this registry.
    pub fn contract_name(&self) -> &'static str {
        match self {
            RegistryName::DataProviders => "DataProvidersNFTs",
            RegistryName::DataAnalyzers => "DataAnalyzersNFTs",
        }
    }
}

/// The requested registry name is not hosted by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown registry: {0:?}")]
pub struct UnknownRegistry(pub String);

impl FromStr for RegistryName {
    type Err = UnknownRegistry;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        RegistryName::ALL
            .into_iter()
            .find(|registry| registry.as_str() == name || registry.contract_name() == name)
            .ok_or_else(|| UnknownRegistry(name.to_string()))
    }
}

impl Display for RegistryName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
