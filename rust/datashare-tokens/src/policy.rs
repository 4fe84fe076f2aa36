use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use datashare_ledger::{
    Address, LedgerGateway, Query, QueryOutput, RegistryName, Transaction, TransactionOptions,
};
use serde::{Deserialize, Serialize};

use crate::error::report;
use crate::token::identity;
use crate::{CredentialError, InvalidInput, RegistryAccessor, ServiceConfig};

/// A named category of data an analyzer may request.
///
/// Labels are opaque: they are compared, stored and returned exactly as
/// written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessPolicy(String);

impl AccessPolicy {
    /// The policy label.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a collection of caller supplied labels into a set. Labels are
    /// kept verbatim; only the empty label is refused. Duplicates collapse.
    pub fn collect<I>(labels: I) -> Result<BTreeSet<AccessPolicy>, InvalidInput>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        labels
            .into_iter()
            .map(|label| label.as_ref().parse())
            .collect()
    }
}

impl FromStr for AccessPolicy {
    type Err = InvalidInput;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        if label.is_empty() {
            return Err(InvalidInput::MalformedPolicy {
                label: label.to_string(),
                reason: "label is empty",
            });
        }

        Ok(Self(label.to_string()))
    }
}

impl From<AccessPolicy> for String {
    fn from(policy: AccessPolicy) -> Self {
        policy.0
    }
}

impl Display for AccessPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access policies granted to one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyGrant {
    /// The analyzer identity
    pub subject: Address,
    /// Policies attached to its credential
    pub policies: BTreeSet<AccessPolicy>,
}

/// Confirmation of an administrative catalog reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyReset {
    /// The confirming transaction
    pub transaction_hash: String,
}

/// Policy labels received from the ledger, taken as they are.
pub(crate) fn policies_from_ledger(labels: Vec<String>) -> BTreeSet<AccessPolicy> {
    labels.into_iter().map(AccessPolicy).collect()
}

/// Reads and resets the access policy catalog kept by the analyzer registry.
///
/// Nothing is cached here: the catalog belongs to the ledger and every call
/// reads it afresh.
pub struct AccessPolicyService<G> {
    registries: Arc<RegistryAccessor<G>>,
    config: ServiceConfig,
}

impl<G> Clone for AccessPolicyService<G> {
    fn clone(&self) -> Self {
        Self {
            registries: Arc::clone(&self.registries),
            config: self.config.clone(),
        }
    }
}

impl<G> AccessPolicyService<G>
where
    G: LedgerGateway + Clone,
{
    /// Create a service resolving registries through `registries`.
    pub fn new(registries: Arc<RegistryAccessor<G>>, config: ServiceConfig) -> Self {
        Self { registries, config }
    }

    /// Every access policy granted since the last reset, in no particular order.
    pub async fn get_all_access_policies(&self) -> Result<BTreeSet<AccessPolicy>, CredentialError> {
        self.read_policies(Query::GetAllAccessPolicies)
            .await
            .inspect(|policies| tracing::debug!(count = policies.len(), "Read access policy catalog"))
            .inspect_err(|error| report("getAllAccessPolicies", error))
    }

    /// Policies granted to `subject`.
    ///
    /// An identity without an analyzer credential and an analyzer without
    /// policies both answer an empty set. Use
    /// [`CredentialService::get_analyzer_token_id`](crate::CredentialService::get_analyzer_token_id)
    /// to tell them apart.
    pub async fn get_access_policies(
        &self,
        subject: impl AsRef<str>,
    ) -> Result<PolicyGrant, CredentialError> {
        let result = async {
            let subject = identity("subject", subject.as_ref())?;
            let policies = self
                .read_policies(Query::GetAccessPolicies {
                    address: subject.clone(),
                })
                .await?;
            tracing::debug!(%subject, count = policies.len(), "Read access policies");
            Ok::<_, CredentialError>(PolicyGrant { subject, policies })
        }
        .await;

        result.inspect_err(|error| report("getAccessPolicies", error))
    }

    /// Clear the catalog and every grant. The ledger only accepts this from
    /// its privileged owner; anyone else gets [`CredentialError::Unauthorized`].
    pub async fn remove_all_access_policies(
        &self,
        initiator: impl AsRef<str>,
    ) -> Result<PolicyReset, CredentialError> {
        self.reset(initiator.as_ref())
            .await
            .inspect_err(|error| report("removeAllAccessPolicies", error))
    }

    async fn read_policies(&self, query: Query) -> Result<BTreeSet<AccessPolicy>, CredentialError> {
        let method = query.method();
        let answer = self
            .registries
            .registry(RegistryName::DataAnalyzers)
            .call(query)
            .await
            .map_err(CredentialError::failed_read)?;

        match answer {
            QueryOutput::AccessPolicies(labels) => Ok(policies_from_ledger(labels)),
            other => Err(CredentialError::unexpected_answer(method, other)),
        }
    }

    async fn reset(&self, initiator: &str) -> Result<PolicyReset, CredentialError> {
        let initiator = identity("initiator", initiator)?;
        let options = TransactionOptions::new(initiator.clone(), self.config.gas_limit);

        let receipt = self
            .registries
            .registry(RegistryName::DataAnalyzers)
            .send(Transaction::RemoveAllAccessPolicies, options)
            .await
            .map_err(|cause| CredentialError::rejected_reset(&initiator, cause))?;

        if !receipt.is_final() {
            return Err(CredentialError::inconclusive(&receipt, "accepted but not final"));
        }

        tracing::info!(
            %initiator,
            hash = %receipt.transaction_hash,
            "[reset] All access policies have been removed"
        );

        Ok(PolicyReset {
            transaction_hash: receipt.transaction_hash,
        })
    }
}
