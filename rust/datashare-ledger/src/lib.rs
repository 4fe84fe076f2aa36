#![warn(missing_docs)]

//! The ledger gateway contract consumed by the datashare credential layer.
//!
//! The ledger itself is an opaque, remote execution environment. It owns two
//! registries, one issuing data provider tokens and one issuing data analyzer
//! tokens (the latter also carries the access policy catalog). This crate
//! describes the operations those registries expose and provides two ways of
//! reaching them:
//!
//! - [`MemoryLedger`]: an in-process simulation of both registries, with the
//!   same ownership, uniqueness and gas rules as the deployed contracts
//! - [`RestGateway`]: an HTTP/JSON client for a remote gateway
//!
//! ```
//! use datashare_ledger::{Address, LedgerGateway, MemoryLedger, Query, QueryOutput, RegistryName};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let owner: Address = "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1".parse()?;
//! let ledger = MemoryLedger::new(owner);
//! let gateway = ledger.connect();
//!
//! let subject: Address = "0xffcf8fdee72ac11b5c542428b35eef5769c409f0".parse()?;
//! let output = gateway
//!     .call(RegistryName::DataProviders, Query::UserToToken { address: subject })
//!     .await?;
//!
//! // Nobody holds a token yet, so the registry answers with its zero sentinel
//! assert_eq!(output, QueryOutput::TokenId(0));
//! # Ok(())
//! # }
//! ```

mod address;
pub use address::*;

mod error;
pub use error::*;

mod registry;
pub use registry::*;

mod sync;
pub use sync::*;

mod transaction;
pub use transaction::*;

pub mod gateway;
pub use gateway::{
    AuthMethod, Fault, LedgerGateway, MemoryGateway, MemoryLedger, RestGateway, RestGatewayConfig,
};
