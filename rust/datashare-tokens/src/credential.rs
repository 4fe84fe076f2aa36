use std::collections::BTreeSet;
use std::sync::Arc;

use datashare_ledger::{Address, LedgerGateway, Query, QueryOutput, Transaction, TransactionOptions};
use serde::{Deserialize, Serialize};

use crate::error::report;
use crate::policy::policies_from_ledger;
use crate::token::identity;
use crate::{AccessPolicy, CredentialError, RegistryAccessor, Role, ServiceConfig, TokenId};

/// A credential that was just issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issued {
    /// The role granted
    pub role: Role,
    /// The identity now holding the credential
    pub subject: Address,
    /// The minted token
    pub token_id: TokenId,
    /// The confirming transaction
    pub transaction_hash: String,
}

/// A credential that was just revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revoked {
    /// The role revoked
    pub role: Role,
    /// The identity that held the credential
    pub subject: Address,
    /// The confirming transaction
    pub transaction_hash: String,
}

/// An active data provider credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderToken {
    /// The holder
    pub subject: Address,
    /// The held token
    pub token_id: TokenId,
}

/// An active data analyzer credential and its access policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerToken {
    /// The holder
    pub subject: Address,
    /// The held token
    pub token_id: TokenId,
    /// Policies attached to the token
    pub policies: BTreeSet<AccessPolicy>,
}

/// Issues, revokes and looks up provider and analyzer credentials.
///
/// Every operation is a single round trip to the ledger and nothing is
/// retried; ledger failures come back as [`CredentialError`] values. The
/// service keeps no state of its own, so clones can be used from many tasks
/// at once.
///
/// Issuance is not idempotent: authorizing a subject that already holds a
/// credential for the role fails with [`CredentialError::AlreadyAuthorized`]
/// and leaves the existing credential in place.
pub struct CredentialService<G> {
    registries: Arc<RegistryAccessor<G>>,
    config: ServiceConfig,
}

impl<G> Clone for CredentialService<G> {
    fn clone(&self) -> Self {
        Self {
            registries: Arc::clone(&self.registries),
            config: self.config.clone(),
        }
    }
}

impl<G> CredentialService<G>
where
    G: LedgerGateway + Clone,
{
    /// Create a service resolving registries through `registries`.
    pub fn new(registries: Arc<RegistryAccessor<G>>, config: ServiceConfig) -> Self {
        Self { registries, config }
    }

    /// Issue a data provider credential to `subject`, on behalf of `initiator`.
    pub async fn authorize_provider(
        &self,
        initiator: impl AsRef<str>,
        subject: impl AsRef<str>,
    ) -> Result<Issued, CredentialError> {
        self.issue(Role::Provider, initiator.as_ref(), subject.as_ref(), None)
            .await
            .inspect_err(|error| report("authorizeProvider", error))
    }

    /// Issue a data analyzer credential carrying `policies` to `subject`, on
    /// behalf of `initiator`. The policy set may be empty.
    pub async fn authorize_analyzer<P>(
        &self,
        initiator: impl AsRef<str>,
        subject: impl AsRef<str>,
        policies: P,
    ) -> Result<Issued, CredentialError>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let result = match AccessPolicy::collect(policies) {
            Ok(policies) => {
                self.issue(
                    Role::Analyzer,
                    initiator.as_ref(),
                    subject.as_ref(),
                    Some(policies),
                )
                .await
            }
            Err(invalid) => Err(invalid.into()),
        };

        result.inspect_err(|error| report("authorizeAnalyzer", error))
    }

    /// Revoke the data provider credential held by `subject`.
    pub async fn unauthorize_provider(
        &self,
        initiator: impl AsRef<str>,
        subject: impl AsRef<str>,
    ) -> Result<Revoked, CredentialError> {
        self.revoke(Role::Provider, initiator.as_ref(), subject.as_ref())
            .await
            .inspect_err(|error| report("unauthorizeProvider", error))
    }

    /// Revoke the data analyzer credential held by `subject`. The ledger
    /// drops the subject's policy grants with it; catalog entries remain.
    pub async fn unauthorize_analyzer(
        &self,
        initiator: impl AsRef<str>,
        subject: impl AsRef<str>,
    ) -> Result<Revoked, CredentialError> {
        self.revoke(Role::Analyzer, initiator.as_ref(), subject.as_ref())
            .await
            .inspect_err(|error| report("unauthorizeAnalyzer", error))
    }

    /// The data provider credential held by `subject`.
    pub async fn get_provider_token_id(
        &self,
        subject: impl AsRef<str>,
    ) -> Result<ProviderToken, CredentialError> {
        let result = async {
            let subject = identity("subject", subject.as_ref())?;

            match self.token_of(Role::Provider, &subject).await? {
                QueryOutput::TokenId(raw) => {
                    let token_id = held(raw, &subject)?;
                    Ok(ProviderToken { subject, token_id })
                }
                other => Err(CredentialError::unexpected_answer("userToToken", other)),
            }
        }
        .await;

        result.inspect_err(|error| report("getProviderTokenId", error))
    }

    /// The data analyzer credential held by `subject`, with its policies.
    pub async fn get_analyzer_token_id(
        &self,
        subject: impl AsRef<str>,
    ) -> Result<AnalyzerToken, CredentialError> {
        let result = async {
            let subject = identity("subject", subject.as_ref())?;

            match self.token_of(Role::Analyzer, &subject).await? {
                QueryOutput::AnalyzerToken {
                    token_id,
                    access_policies,
                } => {
                    let token_id = held(token_id, &subject)?;
                    let policies = policies_from_ledger(access_policies);
                    Ok(AnalyzerToken {
                        subject,
                        token_id,
                        policies,
                    })
                }
                other => Err(CredentialError::unexpected_answer("userToToken", other)),
            }
        }
        .await;

        result.inspect_err(|error| report("getAnalyzerTokenId", error))
    }

    async fn issue(
        &self,
        role: Role,
        initiator: &str,
        subject: &str,
        policies: Option<BTreeSet<AccessPolicy>>,
    ) -> Result<Issued, CredentialError> {
        let initiator = identity("initiator", initiator)?;
        let subject = identity("subject", subject)?;

        let transaction = match policies {
            None => Transaction::AuthorizeProvider {
                recipient: subject.clone(),
            },
            Some(policies) => Transaction::AuthorizeAnalyzer {
                recipient: subject.clone(),
                access_policies: policies.into_iter().map(String::from).collect(),
            },
        };
        let options = TransactionOptions::new(initiator.clone(), self.config.gas_limit);

        let receipt = self
            .registries
            .registry(role.registry())
            .send(transaction, options)
            .await
            .map_err(|cause| CredentialError::rejected_issuance(&initiator, &subject, cause))?;

        if !receipt.is_final() {
            return Err(CredentialError::inconclusive(&receipt, "accepted but not final"));
        }

        let token_id = receipt
            .minted_token(&subject)
            .and_then(TokenId::new)
            .ok_or_else(|| {
                CredentialError::inconclusive(&receipt, "malformed response: no token was minted")
            })?;

        tracing::info!(
            %role,
            %subject,
            %token_id,
            hash = %receipt.transaction_hash,
            "Credential issued"
        );

        Ok(Issued {
            role,
            subject,
            token_id,
            transaction_hash: receipt.transaction_hash,
        })
    }

    async fn revoke(
        &self,
        role: Role,
        initiator: &str,
        subject: &str,
    ) -> Result<Revoked, CredentialError> {
        let initiator = identity("initiator", initiator)?;
        let subject = identity("subject", subject)?;

        let transaction = match role {
            Role::Provider => Transaction::UnauthorizeProvider {
                address: subject.clone(),
            },
            Role::Analyzer => Transaction::UnauthorizeAnalyzer {
                address: subject.clone(),
            },
        };
        let options = TransactionOptions::new(initiator.clone(), self.config.gas_limit);

        let receipt = self
            .registries
            .registry(role.registry())
            .send(transaction, options)
            .await
            .map_err(|cause| CredentialError::rejected_revocation(&initiator, &subject, cause))?;

        if !receipt.is_final() {
            return Err(CredentialError::inconclusive(&receipt, "accepted but not final"));
        }

        tracing::info!(%role, %subject, hash = %receipt.transaction_hash, "[reset] Credential revoked");

        Ok(Revoked {
            role,
            subject,
            transaction_hash: receipt.transaction_hash,
        })
    }

    async fn token_of(&self, role: Role, subject: &Address) -> Result<QueryOutput, CredentialError> {
        let answer = self
            .registries
            .registry(role.registry())
            .call(Query::UserToToken {
                address: subject.clone(),
            })
            .await
            .map_err(CredentialError::failed_read)?;

        tracing::debug!(%role, %subject, ?answer, "Looked up token");
        Ok(answer)
    }
}

/// Translate the registry's raw id, where `0` means "no token".
fn held(raw: u64, subject: &Address) -> Result<TokenId, CredentialError> {
    TokenId::new(raw).ok_or_else(|| CredentialError::no_credential(subject.clone()))
}
