//! In-memory ledger for tests and local development

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::LedgerGateway;
use crate::{
    Address, GatewayError, LedgerEvent, Query, QueryOutput, Receipt, ReceiptStatus, RegistryName,
    Transaction, TransactionOptions, revert,
};

/// Gas charged for minting a token.
pub const AUTHORIZE_GAS: u64 = 120_000;
/// Additional gas charged per access policy granted with an analyzer token.
pub const GRANT_GAS: u64 = 25_000;
/// Gas charged for burning a token.
pub const UNAUTHORIZE_GAS: u64 = 50_000;
/// Base gas charged for resetting the access policy catalog.
pub const RESET_GAS: u64 = 30_000;
/// Additional gas charged per catalog entry and per grant cleared by a reset.
pub const RESET_ENTRY_GAS: u64 = 5_000;

/// A one-shot failure the next gateway operation will exhibit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail without touching state, as if the gateway could not be reached
    Unreachable,
    /// Apply the operation, then report a timeout instead of the outcome
    Timeout,
    /// Apply the transaction but report it as not yet final. No effect on queries.
    Pending,
    /// Apply the transaction but strip the events from its receipt. No effect
    /// on queries.
    DropEvents,
}

#[derive(Default)]
struct RegistryState {
    last_token_id: u64,
    holders: HashMap<Address, u64>,
    grants: HashMap<u64, BTreeSet<String>>,
    catalog: BTreeSet<String>,
}

impl RegistryState {
    fn mint(&mut self, recipient: &Address) -> Result<u64, GatewayError> {
        if recipient.is_zero() {
            return Err(GatewayError::Reverted {
                reason: Some("ERC721: mint to the zero address".into()),
            });
        }

        if self.holders.contains_key(recipient) {
            return Err(GatewayError::Reverted {
                reason: Some(revert::ALREADY_AUTHORIZED.into()),
            });
        }

        self.last_token_id += 1;
        self.holders.insert(recipient.clone(), self.last_token_id);
        Ok(self.last_token_id)
    }

    fn burn(&mut self, holder: &Address) -> Result<u64, GatewayError> {
        let token_id = self
            .holders
            .remove(holder)
            .ok_or_else(|| GatewayError::Reverted {
                reason: Some(revert::NO_TOKEN.into()),
            })?;

        // Grants never outlive the token they were attached to
        self.grants.remove(&token_id);
        Ok(token_id)
    }

    fn policies_of(&self, holder: &Address) -> Vec<String> {
        self.holders
            .get(holder)
            .and_then(|token_id| self.grants.get(token_id))
            .map(|policies| policies.iter().cloned().collect())
            .unwrap_or_default()
    }
}

struct LedgerState {
    owner: Address,
    registries: HashMap<RegistryName, RegistryState>,
    faults: VecDeque<Fault>,
    sequence: u64,
}

impl LedgerState {
    fn registry(&mut self, name: RegistryName) -> &mut RegistryState {
        self.registries.entry(name).or_default()
    }

    fn gas_required(&mut self, transaction: &Transaction) -> u64 {
        match transaction {
            Transaction::AuthorizeProvider { .. } => AUTHORIZE_GAS,
            Transaction::AuthorizeAnalyzer {
                access_policies, ..
            } => AUTHORIZE_GAS + GRANT_GAS * access_policies.len() as u64,
            Transaction::UnauthorizeProvider { .. } | Transaction::UnauthorizeAnalyzer { .. } => {
                UNAUTHORIZE_GAS
            }
            Transaction::RemoveAllAccessPolicies => {
                let analyzers = self.registry(RegistryName::DataAnalyzers);
                let entries = analyzers.catalog.len() + analyzers.grants.len();
                RESET_GAS + RESET_ENTRY_GAS * entries as u64
            }
        }
    }

    fn execute(
        &mut self,
        registry: RegistryName,
        transaction: Transaction,
    ) -> Result<Vec<LedgerEvent>, GatewayError> {
        let state = self.registry(registry);

        match transaction {
            Transaction::AuthorizeProvider { recipient } => {
                let token_id = state.mint(&recipient)?;
                Ok(vec![LedgerEvent::Transfer {
                    from: Address::zero(),
                    to: recipient,
                    token_id,
                }])
            }
            Transaction::AuthorizeAnalyzer {
                recipient,
                access_policies,
            } => {
                let token_id = state.mint(&recipient)?;
                let policies: BTreeSet<String> = access_policies.into_iter().collect();
                state.catalog.extend(policies.iter().cloned());
                state.grants.insert(token_id, policies);
                Ok(vec![LedgerEvent::Transfer {
                    from: Address::zero(),
                    to: recipient,
                    token_id,
                }])
            }
            Transaction::UnauthorizeProvider { address }
            | Transaction::UnauthorizeAnalyzer { address } => {
                let token_id = state.burn(&address)?;
                Ok(vec![LedgerEvent::Transfer {
                    from: address,
                    to: Address::zero(),
                    token_id,
                }])
            }
            Transaction::RemoveAllAccessPolicies => {
                state.catalog.clear();
                state.grants.clear();
                Ok(Vec::new())
            }
        }
    }

    fn query(&mut self, registry: RegistryName, query: Query) -> Result<QueryOutput, GatewayError> {
        let unsupported = GatewayError::UnsupportedOperation {
            registry,
            method: query.method().to_string(),
        };
        let state = self.registry(registry);

        match (registry, query) {
            (RegistryName::DataProviders, Query::UserToToken { address }) => Ok(
                QueryOutput::TokenId(state.holders.get(&address).copied().unwrap_or(0)),
            ),
            (RegistryName::DataAnalyzers, Query::UserToToken { address }) => {
                Ok(QueryOutput::AnalyzerToken {
                    token_id: state.holders.get(&address).copied().unwrap_or(0),
                    access_policies: state.policies_of(&address),
                })
            }
            (RegistryName::DataAnalyzers, Query::GetAllAccessPolicies) => Ok(
                QueryOutput::AccessPolicies(state.catalog.iter().cloned().collect()),
            ),
            (RegistryName::DataAnalyzers, Query::GetAccessPolicies { address }) => {
                Ok(QueryOutput::AccessPolicies(state.policies_of(&address)))
            }
            (RegistryName::DataProviders, _) => Err(unsupported),
        }
    }

    fn transaction_hash(&self, method: &str, from: &Address) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.sequence.to_be_bytes());
        hasher.update(method.as_bytes());
        hasher.update(from.as_str().as_bytes());
        format!("0x{}", hasher.finalize().to_hex())
    }
}

/// In-memory ledger hosting both registries.
///
/// Every connected [`MemoryGateway`] shares the same state, so several
/// services can observe each other's transactions. Only the owner passed to
/// [`MemoryLedger::new`] may send transactions.
///
/// # Examples
///
/// ```
/// use datashare_ledger::{Address, LedgerGateway, MemoryLedger, RegistryName, Transaction, TransactionOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let owner: Address = "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1".parse()?;
/// let recipient: Address = "0xffcf8fdee72ac11b5c542428b35eef5769c409f0".parse()?;
///
/// let ledger = MemoryLedger::new(owner.clone());
/// let receipt = ledger
///     .connect()
///     .send(
///         RegistryName::DataProviders,
///         Transaction::AuthorizeProvider { recipient: recipient.clone() },
///         TransactionOptions::new(owner, 1_000_000),
///     )
///     .await?;
///
/// assert_eq!(receipt.minted_token(&recipient), Some(1));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl MemoryLedger {
    /// Create an empty ledger whose registries are owned by `owner`.
    pub fn new(owner: Address) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState {
                owner,
                registries: HashMap::new(),
                faults: VecDeque::new(),
                sequence: 0,
            })),
        }
    }

    /// Queue a fault for the next gateway operation. Faults are consumed in
    /// the order they were injected, one per operation.
    pub async fn inject(&self, fault: Fault) {
        self.state.write().await.faults.push_back(fault);
    }

    /// Create a new gateway connected to this ledger
    pub fn connect(&self) -> MemoryGateway {
        MemoryGateway {
            state: Arc::clone(&self.state),
        }
    }
}

/// Gateway to a [`MemoryLedger`].
///
/// This is created by calling `connect()` on a `MemoryLedger`.
#[derive(Clone)]
pub struct MemoryGateway {
    state: Arc<RwLock<LedgerState>>,
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl LedgerGateway for MemoryGateway {
    async fn send(
        &self,
        registry: RegistryName,
        transaction: Transaction,
        options: TransactionOptions,
    ) -> Result<Receipt, GatewayError> {
        let mut state = self.state.write().await;
        let fault = state.faults.pop_front();

        if fault == Some(Fault::Unreachable) {
            return Err(GatewayError::Unreachable("memory ledger is offline".into()));
        }

        if transaction.registry() != registry {
            return Err(GatewayError::UnsupportedOperation {
                registry,
                method: transaction.method().to_string(),
            });
        }

        let required = state.gas_required(&transaction);
        if options.gas < required {
            return Err(GatewayError::OutOfGas {
                limit: options.gas,
                required,
            });
        }

        if options.from != state.owner {
            return Err(GatewayError::Reverted {
                reason: Some(revert::NOT_OWNER.into()),
            });
        }

        let method = transaction.method();
        let events = state.execute(registry, transaction)?;
        state.sequence += 1;

        let mut receipt = Receipt {
            transaction_hash: state.transaction_hash(method, &options.from),
            status: ReceiptStatus::Finalized,
            gas_used: required,
            events,
        };
        tracing::debug!(%registry, method, hash = %receipt.transaction_hash, "Executed transaction");

        match fault {
            Some(Fault::Timeout) => {
                return Err(GatewayError::Timeout(format!(
                    "no receipt for {}",
                    receipt.transaction_hash
                )));
            }
            Some(Fault::Pending) => receipt.status = ReceiptStatus::Pending,
            Some(Fault::DropEvents) => receipt.events.clear(),
            _ => {}
        }

        Ok(receipt)
    }

    async fn call(&self, registry: RegistryName, query: Query) -> Result<QueryOutput, GatewayError> {
        let mut state = self.state.write().await;

        match state.faults.pop_front() {
            Some(Fault::Unreachable) => {
                Err(GatewayError::Unreachable("memory ledger is offline".into()))
            }
            Some(Fault::Timeout) => Err(GatewayError::Timeout(format!(
                "no answer to {}",
                query.method()
            ))),
            _ => state.query(registry, query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAS: u64 = 1_000_000;

    fn owner() -> Address {
        "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1".parse().unwrap()
    }

    fn subject(byte: u8) -> Address {
        format!("0x{}", format!("{byte:02x}").repeat(20))
            .parse()
            .unwrap()
    }

    fn authorize_provider(recipient: Address) -> Transaction {
        Transaction::AuthorizeProvider { recipient }
    }

    async fn send(
        gateway: &MemoryGateway,
        transaction: Transaction,
    ) -> Result<Receipt, GatewayError> {
        gateway
            .send(
                transaction.registry(),
                transaction,
                TransactionOptions::new(owner(), GAS),
            )
            .await
    }

    #[tokio::test]
    async fn it_mints_increasing_token_ids() {
        let gateway = MemoryLedger::new(owner()).connect();

        let first = send(&gateway, authorize_provider(subject(1))).await.unwrap();
        let second = send(&gateway, authorize_provider(subject(2))).await.unwrap();

        assert_eq!(first.minted_token(&subject(1)), Some(1));
        assert_eq!(second.minted_token(&subject(2)), Some(2));
        assert_ne!(first.transaction_hash, second.transaction_hash);
        assert!(first.is_final());
    }

    #[tokio::test]
    async fn it_rejects_second_token_for_holder() {
        let gateway = MemoryLedger::new(owner()).connect();

        send(&gateway, authorize_provider(subject(1))).await.unwrap();
        let result = send(&gateway, authorize_provider(subject(1))).await;

        assert_eq!(
            result,
            Err(GatewayError::Reverted {
                reason: Some(revert::ALREADY_AUTHORIZED.into())
            })
        );
        assert_eq!(
            gateway
                .call(
                    RegistryName::DataProviders,
                    Query::UserToToken {
                        address: subject(1)
                    }
                )
                .await,
            Ok(QueryOutput::TokenId(1))
        );
    }

    #[tokio::test]
    async fn it_never_reuses_burned_token_ids() {
        let gateway = MemoryLedger::new(owner()).connect();

        send(&gateway, authorize_provider(subject(1))).await.unwrap();
        send(
            &gateway,
            Transaction::UnauthorizeProvider {
                address: subject(1),
            },
        )
        .await
        .unwrap();
        let receipt = send(&gateway, authorize_provider(subject(1))).await.unwrap();

        assert_eq!(receipt.minted_token(&subject(1)), Some(2));
    }

    #[tokio::test]
    async fn it_only_lets_the_owner_send() {
        let gateway = MemoryLedger::new(owner()).connect();

        let result = gateway
            .send(
                RegistryName::DataProviders,
                authorize_provider(subject(1)),
                TransactionOptions::new(subject(9), GAS),
            )
            .await;

        assert_eq!(
            result,
            Err(GatewayError::Reverted {
                reason: Some(revert::NOT_OWNER.into())
            })
        );
    }

    #[tokio::test]
    async fn it_enforces_gas_ceiling() {
        let gateway = MemoryLedger::new(owner()).connect();

        let result = gateway
            .send(
                RegistryName::DataAnalyzers,
                Transaction::AuthorizeAnalyzer {
                    recipient: subject(1),
                    access_policies: vec!["a".into(), "b".into()],
                },
                TransactionOptions::new(owner(), AUTHORIZE_GAS),
            )
            .await;

        assert_eq!(
            result,
            Err(GatewayError::OutOfGas {
                limit: AUTHORIZE_GAS,
                required: AUTHORIZE_GAS + 2 * GRANT_GAS
            })
        );
        assert_eq!(
            gateway
                .call(RegistryName::DataAnalyzers, Query::GetAllAccessPolicies)
                .await,
            Ok(QueryOutput::AccessPolicies(vec![]))
        );
    }

    #[tokio::test]
    async fn it_rejects_transaction_sent_to_wrong_registry() {
        let gateway = MemoryLedger::new(owner()).connect();

        let result = gateway
            .send(
                RegistryName::DataAnalyzers,
                authorize_provider(subject(1)),
                TransactionOptions::new(owner(), GAS),
            )
            .await;

        assert!(matches!(
            result,
            Err(GatewayError::UnsupportedOperation { .. })
        ));
    }

    #[tokio::test]
    async fn it_clears_grants_but_keeps_the_catalog_on_burn() {
        let gateway = MemoryLedger::new(owner()).connect();

        send(
            &gateway,
            Transaction::AuthorizeAnalyzer {
                recipient: subject(1),
                access_policies: vec!["health_data".into(), "health_data".into()],
            },
        )
        .await
        .unwrap();
        send(
            &gateway,
            Transaction::UnauthorizeAnalyzer {
                address: subject(1),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            gateway
                .call(
                    RegistryName::DataAnalyzers,
                    Query::GetAccessPolicies {
                        address: subject(1)
                    }
                )
                .await,
            Ok(QueryOutput::AccessPolicies(vec![]))
        );
        assert_eq!(
            gateway
                .call(RegistryName::DataAnalyzers, Query::GetAllAccessPolicies)
                .await,
            Ok(QueryOutput::AccessPolicies(vec!["health_data".into()]))
        );
    }

    #[tokio::test]
    async fn it_consumes_faults_in_order() {
        let ledger = MemoryLedger::new(owner());
        let gateway = ledger.connect();

        ledger.inject(Fault::Unreachable).await;
        ledger.inject(Fault::Pending).await;

        let offline = send(&gateway, authorize_provider(subject(1))).await;
        assert!(matches!(offline, Err(GatewayError::Unreachable(_))));

        let pending = send(&gateway, authorize_provider(subject(1))).await.unwrap();
        assert_eq!(pending.status, ReceiptStatus::Pending);

        let query = gateway
            .call(
                RegistryName::DataProviders,
                Query::UserToToken {
                    address: subject(1),
                },
            )
            .await;
        assert_eq!(query, Ok(QueryOutput::TokenId(1)));
    }

    #[tokio::test]
    async fn it_has_no_policies_on_the_provider_registry() {
        let gateway = MemoryLedger::new(owner()).connect();

        let result = gateway
            .call(RegistryName::DataProviders, Query::GetAllAccessPolicies)
            .await;

        assert!(matches!(
            result,
            Err(GatewayError::UnsupportedOperation {
                registry: RegistryName::DataProviders,
                ..
            })
        ));
    }
}
