#![warn(missing_docs)]

//! Credentials for the data-sharing platform.
//!
//! Two registries on the ledger issue non-transferable tokens: one for data
//! providers, one for data analyzers. An identity holds at most one token per
//! registry. Analyzer tokens also carry a set of access policies naming the
//! categories of data the analyzer may request.
//!
//! - [`CredentialService`] issues, revokes and looks up tokens
//! - [`AccessPolicyService`] reads the access policy catalog and resets it
//! - [`RegistryAccessor`] resolves registry names to handles on a
//!   [`LedgerGateway`](datashare_ledger::LedgerGateway)
//!
//! Every operation returns a [`CredentialError`] on failure, normalized from
//! whatever the ledger reported.
//!
//! # Example
//!
//! ```
//! use datashare_ledger::{Address, MemoryLedger};
//! use datashare_tokens::{Datashare, ServiceConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let admin: Address = "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1".parse()?;
//! let analyzer = "0xffcf8fdee72ac11b5c542428b35eef5769c409f0";
//!
//! let ledger = MemoryLedger::new(admin.clone());
//! let datashare = Datashare::new(ledger.connect(), ServiceConfig::default());
//!
//! let issued = datashare
//!     .credentials
//!     .authorize_analyzer(&admin, analyzer, ["health_data"])
//!     .await?;
//!
//! let grant = datashare.policies.get_access_policies(analyzer).await?;
//! assert_eq!(grant.policies.len(), 1);
//! assert_eq!(issued.token_id.get(), 1);
//! # Ok(())
//! # }
//! ```

mod config;
pub use config::*;

mod credential;
pub use credential::*;

mod error;
pub use error::*;

mod policy;
pub use policy::*;

mod registry;
pub use registry::*;

mod service;
pub use service::*;

mod token;
pub use token::*;
