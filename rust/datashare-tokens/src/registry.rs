use std::collections::HashMap;

use datashare_ledger::{
    GatewayError, LedgerGateway, Query, QueryOutput, Receipt, RegistryName, Transaction,
    TransactionOptions,
};
use parking_lot::RwLock;

use crate::InvalidInput;

/// A reference to one registry's namespace on the ledger.
///
/// Handles hold no state of their own; two handles for the same registry
/// behave identically.
#[derive(Debug, Clone)]
pub struct RegistryHandle<G> {
    name: RegistryName,
    gateway: G,
}

impl<G> RegistryHandle<G>
where
    G: LedgerGateway,
{
    /// The registry this handle addresses.
    pub fn name(&self) -> RegistryName {
        self.name
    }

    /// Submit a transaction to this registry.
    pub async fn send(
        &self,
        transaction: Transaction,
        options: TransactionOptions,
    ) -> Result<Receipt, GatewayError> {
        self.gateway.send(self.name, transaction, options).await
    }

    /// Run a query against this registry.
    pub async fn call(&self, query: Query) -> Result<QueryOutput, GatewayError> {
        self.gateway.call(self.name, query).await
    }
}

/// Resolves registry names to handles on a gateway.
///
/// Handles are created on first use and cached for the accessor's lifetime.
pub struct RegistryAccessor<G> {
    gateway: G,
    handles: RwLock<HashMap<RegistryName, RegistryHandle<G>>>,
}

impl<G> RegistryAccessor<G>
where
    G: LedgerGateway + Clone,
{
    /// Create an accessor for the registries reachable through `gateway`.
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a logical registry name (`DataProvidersRegistry`,
    /// `DataAnalyzersRegistry`, or their contract names) to a handle.
    pub fn resolve(&self, name: &str) -> Result<RegistryHandle<G>, InvalidInput> {
        Ok(self.registry(name.parse()?))
    }

    /// The handle for a known registry.
    pub fn registry(&self, name: RegistryName) -> RegistryHandle<G> {
        if let Some(handle) = self.handles.read().get(&name) {
            return handle.clone();
        }

        self.handles
            .write()
            .entry(name)
            .or_insert_with(|| RegistryHandle {
                name,
                gateway: self.gateway.clone(),
            })
            .clone()
    }
}
