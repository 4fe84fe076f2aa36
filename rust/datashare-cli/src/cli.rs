use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use url::Url;

/// Command line arguments of the `datashare` binary.
#[derive(Debug, Parser)]
#[command(name = "datashare")]
#[command(bin_name = "datashare")]
#[command(about = "Administer data provider and data analyzer credentials", long_about = None)]
pub struct DatashareCli {
    /// Connection and identity settings
    #[command(flatten)]
    pub overrides: Overrides,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Settings that take precedence over the configuration file.
#[derive(Debug, Default, Clone, Args)]
pub struct Overrides {
    /// Path of the JSON configuration file
    #[arg(long, global = true, env = "DATASHARE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the ledger gateway
    #[arg(long, global = true, env = "DATASHARE_ENDPOINT")]
    pub endpoint: Option<Url>,

    /// Bearer token presented to the gateway
    #[arg(long, global = true, env = "DATASHARE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "DATASHARE_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Gas ceiling attached to every transaction
    #[arg(long, global = true, env = "DATASHARE_GAS")]
    pub gas: Option<u64>,

    /// Identity that initiates transactions
    #[arg(long, global = true, env = "DATASHARE_FROM")]
    pub from: Option<String>,
}

/// Top level commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Manage data provider credentials
    Provider {
        /// Provider operation
        #[command(subcommand)]
        command: ProviderCommand,
    },

    /// Manage data analyzer credentials
    Analyzer {
        /// Analyzer operation
        #[command(subcommand)]
        command: AnalyzerCommand,
    },

    /// Inspect access policies
    Policies {
        /// Policy operation
        #[command(subcommand)]
        command: PolicyCommand,
    },

    /// Privileged maintenance
    Admin {
        /// Admin operation
        #[command(subcommand)]
        command: AdminCommand,
    },
}

/// Data provider commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ProviderCommand {
    /// Issue a data provider credential
    Authorize {
        /// Identity receiving the credential
        subject: String,
    },

    /// Revoke a data provider credential
    Revoke {
        /// Identity holding the credential
        subject: String,
    },

    /// Show the credential held by an identity
    Show {
        /// Identity to look up
        subject: String,
    },
}

/// Data analyzer commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum AnalyzerCommand {
    /// Issue a data analyzer credential
    Authorize {
        /// Identity receiving the credential
        subject: String,

        /// Access policy granted with the credential (repeatable)
        #[arg(short, long = "policy")]
        policies: Vec<String>,
    },

    /// Revoke a data analyzer credential and its policy grants
    Revoke {
        /// Identity holding the credential
        subject: String,
    },

    /// Show the credential held by an identity, with its policies
    Show {
        /// Identity to look up
        subject: String,
    },
}

/// Access policy commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum PolicyCommand {
    /// List the policy catalog, or the policies granted to one identity
    List {
        /// Identity whose grants to list
        subject: Option<String>,
    },
}

/// Privileged commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum AdminCommand {
    /// Remove every access policy from the catalog and from every analyzer
    ResetPolicies {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

impl Command {
    /// Whether the command submits a transaction and needs an initiator.
    pub fn is_write(&self) -> bool {
        match self {
            Command::Provider { command } => !matches!(command, ProviderCommand::Show { .. }),
            Command::Analyzer { command } => !matches!(command, AnalyzerCommand::Show { .. }),
            Command::Policies { .. } => false,
            Command::Admin { .. } => true,
        }
    }
}
