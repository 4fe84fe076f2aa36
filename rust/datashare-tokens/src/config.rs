use serde::{Deserialize, Serialize};

/// Gas ceiling attached to every write unless configured otherwise.
pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;

/// Settings shared by the credential and access policy services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Gas ceiling attached to every transaction
    pub gas_limit: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }
}

impl ServiceConfig {
    /// Set the gas ceiling attached to every transaction
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_defaults_missing_fields() {
        let config: ServiceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ServiceConfig::default());

        let config: ServiceConfig = serde_json::from_str(r#"{"gasLimit": 250000}"#).unwrap();
        assert_eq!(config.gas_limit, 250_000);
    }
}
