use std::sync::Arc;

use datashare_ledger::LedgerGateway;

use crate::{AccessPolicyService, CredentialService, RegistryAccessor, ServiceConfig};

/// The credential and access policy services, sharing one registry accessor.
pub struct Datashare<G> {
    /// Issues, revokes and looks up credentials
    pub credentials: CredentialService<G>,
    /// Reads and resets access policies
    pub policies: AccessPolicyService<G>,
}

impl<G> Clone for Datashare<G> {
    fn clone(&self) -> Self {
        Self {
            credentials: self.credentials.clone(),
            policies: self.policies.clone(),
        }
    }
}

impl<G> Datashare<G>
where
    G: LedgerGateway + Clone,
{
    /// Build both services on top of `gateway`.
    pub fn new(gateway: G, config: ServiceConfig) -> Self {
        let registries = Arc::new(RegistryAccessor::new(gateway));

        Self {
            credentials: CredentialService::new(Arc::clone(&registries), config.clone()),
            policies: AccessPolicyService::new(registries, config),
        }
    }
}
