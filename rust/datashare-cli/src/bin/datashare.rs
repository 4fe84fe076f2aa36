use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use datashare_cli::{CliConfig, DatashareCli, describe_failure, execute};
use datashare_ledger::RestGateway;
use datashare_tokens::Datashare;
use tracing_subscriber::EnvFilter;

#[tokio::main]
pub async fn main() -> ExitCode {
    let cli = DatashareCli::parse();

    let fallback = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(output) => {
            println!("{output:#}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{:#}", describe_failure(&error));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: DatashareCli) -> Result<serde_json::Value> {
    let config = CliConfig::discover(cli.overrides.config.as_deref())?.merge(&cli.overrides);
    tracing::debug!(endpoint = ?config.endpoint, gas = ?config.gas_limit, "Resolved configuration");

    let gateway = RestGateway::new(config.gateway()?);
    let datashare = Datashare::new(gateway, config.service());

    execute(&datashare, config.from.as_deref(), cli.command).await
}
