//! Gateways to the ledger
//!
//! A [`LedgerGateway`] submits transactions to, and runs queries against, a
//! named registry. Each call is a single round trip; gateways never retry on
//! their own.

use async_trait::async_trait;

use crate::{
    ConditionalSync, GatewayError, Query, QueryOutput, Receipt, RegistryName, Transaction,
    TransactionOptions,
};

mod memory;
pub use memory::*;

mod rest;
pub use rest::*;

/// The operation contract of the remote ledger.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait LedgerGateway: ConditionalSync {
    /// Submit a state-changing transaction to `registry` on behalf of
    /// `options.from`, bounded by `options.gas`.
    ///
    /// A returned [`Receipt`] means the ledger accepted the transaction; the
    /// state change is only established once [`Receipt::is_final`] holds.
    async fn send(
        &self,
        registry: RegistryName,
        transaction: Transaction,
        options: TransactionOptions,
    ) -> Result<Receipt, GatewayError>;

    /// Run a read-only query against `registry`.
    async fn call(&self, registry: RegistryName, query: Query) -> Result<QueryOutput, GatewayError>;
}
