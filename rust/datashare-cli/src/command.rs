use anyhow::{Result, bail};
use datashare_ledger::LedgerGateway;
use datashare_tokens::Datashare;
use serde_json::{Value, json};

use crate::{AdminCommand, AnalyzerCommand, Command, PolicyCommand, ProviderCommand};

/// Run one command, returning the JSON document to print.
///
/// `from` is the initiating identity. Commands that submit transactions fail
/// before contacting the ledger when it is missing; reads ignore it.
/// Credential failures are returned as
/// [`CredentialError`](datashare_tokens::CredentialError) inside the
/// [`anyhow::Error`] so callers can downcast and report them.
pub async fn execute<G>(
    datashare: &Datashare<G>,
    from: Option<&str>,
    command: Command,
) -> Result<Value>
where
    G: LedgerGateway + Clone,
{
    let initiator = match from {
        Some(from) => from,
        None if command.is_write() => {
            bail!("No initiator: pass --from, set DATASHARE_FROM or add it to the config file")
        }
        None => "",
    };

    let output = match command {
        Command::Provider { command } => match command {
            ProviderCommand::Authorize { subject } => json!(
                datashare
                    .credentials
                    .authorize_provider(initiator, subject)
                    .await?
            ),
            ProviderCommand::Revoke { subject } => json!(
                datashare
                    .credentials
                    .unauthorize_provider(initiator, subject)
                    .await?
            ),
            ProviderCommand::Show { subject } => {
                json!(datashare.credentials.get_provider_token_id(subject).await?)
            }
        },
        Command::Analyzer { command } => match command {
            AnalyzerCommand::Authorize { subject, policies } => json!(
                datashare
                    .credentials
                    .authorize_analyzer(initiator, subject, policies)
                    .await?
            ),
            AnalyzerCommand::Revoke { subject } => json!(
                datashare
                    .credentials
                    .unauthorize_analyzer(initiator, subject)
                    .await?
            ),
            AnalyzerCommand::Show { subject } => {
                json!(datashare.credentials.get_analyzer_token_id(subject).await?)
            }
        },
        Command::Policies {
            command: PolicyCommand::List { subject },
        } => match subject {
            Some(subject) => json!(datashare.policies.get_access_policies(subject).await?),
            None => json!({ "policies": datashare.policies.get_all_access_policies().await? }),
        },
        Command::Admin {
            command: AdminCommand::ResetPolicies { yes },
        } => {
            if !yes {
                bail!("Refusing to remove every access policy without --yes");
            }
            json!(
                datashare
                    .policies
                    .remove_all_access_policies(initiator)
                    .await?
            )
        }
    };

    Ok(output)
}

/// JSON description of a failure, for printing to stderr.
pub fn describe_failure(error: &anyhow::Error) -> Value {
    match error.downcast_ref::<datashare_tokens::CredentialError>() {
        Some(failure) => json!({
            "error": failure.kind(),
            "message": failure.to_string(),
            "effect": failure.effect(),
            "retryable": failure.is_retryable(),
        }),
        None => json!({ "error": "usage", "message": format!("{error:#}") }),
    }
}
