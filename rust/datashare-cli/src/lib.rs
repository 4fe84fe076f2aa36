#![warn(missing_docs)]

//! # Datashare CLI
//!
//! Command line administration of the data provider and data analyzer
//! registries through a remote ledger gateway.
//!
//! ## Usage
//!
//! ```bash
//! datashare --endpoint https://ledger.example.com/v1 --from 0x90f8... \
//!     analyzer authorize 0xffcf... --policy health_data
//! datashare provider show 0x22d4...
//! datashare policies list
//! datashare admin reset-policies --yes
//! ```
//!
//! Connection settings come from a JSON file (`--config`, or
//! `datashare/config.json` in the platform configuration directory), then
//! from `DATASHARE_*` environment variables, then from flags. Results are
//! printed to stdout as JSON; failures are printed to stderr as JSON and the
//! process exits with a non-zero status. Set `RUST_LOG` or pass `--verbose`
//! for logs.

mod cli;
pub use cli::*;

mod command;
pub use command::*;

mod config;
pub use config::*;
