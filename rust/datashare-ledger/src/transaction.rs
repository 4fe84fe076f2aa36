use serde::{Deserialize, Serialize};

use crate::{Address, RegistryName};

/// A state-changing registry operation.
///
/// Serialized as `{"method": ..., "params": {...}}` using the method names of
/// the deployed contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum Transaction {
    /// Mint a provider token for `recipient`
    AuthorizeProvider {
        /// Receiver of the token
        recipient: Address,
    },

    /// Burn the provider token held by `address`
    UnauthorizeProvider {
        /// Current holder
        address: Address,
    },

    /// Mint an analyzer token for `recipient` carrying `access_policies`
    #[serde(rename_all = "camelCase")]
    AuthorizeAnalyzer {
        /// Receiver of the token
        recipient: Address,
        /// Access policies granted with the token
        access_policies: Vec<String>,
    },

    /// Burn the analyzer token held by `address`
    UnauthorizeAnalyzer {
        /// Current holder
        address: Address,
    },

    /// Clear the access policy catalog and every grant. Owner only.
    RemoveAllAccessPolicies,
}

impl Transaction {
    /// The contract method this transaction invokes.
    pub fn method(&self) -> &'static str {
        match self {
            Transaction::AuthorizeProvider { .. } => "authorizeProvider",
            Transaction::UnauthorizeProvider { .. } => "unauthorizeProvider",
            Transaction::AuthorizeAnalyzer { .. } => "authorizeAnalyzer",
            Transaction::UnauthorizeAnalyzer { .. } => "unauthorizeAnalyzer",
            Transaction::RemoveAllAccessPolicies => "removeAllAccessPolicies",
        }
    }

    /// The registry that implements this transaction.
    pub fn registry(&self) -> RegistryName {
        match self {
            Transaction::AuthorizeProvider { .. } | Transaction::UnauthorizeProvider { .. } => {
                RegistryName::DataProviders
            }
            _ => RegistryName::DataAnalyzers,
        }
    }
}

/// A read-only registry operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum Query {
    /// Token held by `address`. Answers `0` when there is none.
    UserToToken {
        /// Holder to look up
        address: Address,
    },

    /// Every access policy ever granted and not since reset
    GetAllAccessPolicies,

    /// Access policies attached to the token held by `address`
    GetAccessPolicies {
        /// Holder to look up
        address: Address,
    },
}

impl Query {
    /// The contract method this query invokes.
    pub fn method(&self) -> &'static str {
        match self {
            Query::UserToToken { .. } => "userToToken",
            Query::GetAllAccessPolicies => "getAllAccessPolicies",
            Query::GetAccessPolicies { .. } => "getAccessPolicies",
        }
    }
}

/// The raw answer to a [`Query`].
///
/// Token ids are returned exactly as the registry stores them, zero sentinel
/// included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum QueryOutput {
    /// A provider token id
    TokenId(u64),

    /// An analyzer token id together with its access policies
    #[serde(rename_all = "camelCase")]
    AnalyzerToken {
        /// The token id
        token_id: u64,
        /// Policies attached to the token
        access_policies: Vec<String>,
    },

    /// A list of access policy labels
    AccessPolicies(Vec<String>),
}

/// Sender and resource ceiling attached to every [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
    /// The initiating identity
    pub from: Address,
    /// Maximum gas the transaction may consume
    pub gas: u64,
}

impl TransactionOptions {
    /// Options for a transaction sent by `from` with a `gas` ceiling.
    pub fn new(from: Address, gas: u64) -> Self {
        Self { from, gas }
    }
}

/// Whether the ledger has committed a transaction irreversibly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReceiptStatus {
    /// The state change is final
    Finalized,
    /// The transaction was accepted but is not final yet
    Pending,
}

/// An event emitted while executing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LedgerEvent {
    /// Token ownership changed. Mints come from the zero address, burns go to it.
    #[serde(rename = "Transfer", rename_all = "camelCase")]
    Transfer {
        /// Previous owner
        from: Address,
        /// New owner
        to: Address,
        /// The transferred token
        token_id: u64,
    },
}

/// The ledger's confirmation of a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Hash identifying the transaction
    pub transaction_hash: String,
    /// Finality of the state change
    pub status: ReceiptStatus,
    /// Gas consumed by execution
    pub gas_used: u64,
    /// Events emitted during execution
    #[serde(default)]
    pub events: Vec<LedgerEvent>,
}

impl Receipt {
    /// Whether the state change is final.
    pub fn is_final(&self) -> bool {
        self.status == ReceiptStatus::Finalized
    }

    /// The id of the token minted to `recipient`, if this receipt records one.
    pub fn minted_token(&self, recipient: &Address) -> Option<u64> {
        self.events.iter().find_map(|event| match event {
            LedgerEvent::Transfer { from, to, token_id } if from.is_zero() && to == recipient => {
                Some(*token_id)
            }
            _ => None,
        })
    }
}
