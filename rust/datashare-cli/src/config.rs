use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use datashare_ledger::{AuthMethod, RestGatewayConfig};
use datashare_tokens::{DEFAULT_GAS_LIMIT, ServiceConfig};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Overrides;

/// Contents of the JSON configuration file. Every field is optional.
///
/// ```json
/// {
///   "endpoint": "https://ledger.example.com/v1",
///   "token": "secret",
///   "timeoutSeconds": 30,
///   "gasLimit": 1000000,
///   "from": "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CliConfig {
    /// Base URL of the ledger gateway
    pub endpoint: Option<Url>,
    /// Bearer token presented to the gateway
    pub token: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: Option<u64>,
    /// Gas ceiling attached to every transaction
    pub gas_limit: Option<u64>,
    /// Identity that initiates transactions
    pub from: Option<String>,
    /// Extra headers sent with every request
    pub headers: Vec<(String, String)>,
}

impl CliConfig {
    /// Where the configuration lives when `--config` is not given.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("datashare").join("config.json"))
    }

    /// Read a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Read the configuration named by `--config`, or the default file if it
    /// exists. An explicitly named file must exist.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Apply command line and environment overrides on top of the file.
    pub fn merge(mut self, overrides: &Overrides) -> Self {
        if let Some(endpoint) = &overrides.endpoint {
            self.endpoint = Some(endpoint.clone());
        }
        if let Some(token) = &overrides.token {
            self.token = Some(token.clone());
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout_seconds = Some(timeout);
        }
        if let Some(gas) = overrides.gas {
            self.gas_limit = Some(gas);
        }
        if let Some(from) = &overrides.from {
            self.from = Some(from.clone());
        }
        self
    }

    /// Gateway settings. Fails if no endpoint was configured anywhere.
    pub fn gateway(&self) -> Result<RestGatewayConfig> {
        let endpoint = self.endpoint.clone().ok_or_else(|| {
            anyhow!("No gateway endpoint: pass --endpoint, set DATASHARE_ENDPOINT or add it to the config file")
        })?;

        let mut config = RestGatewayConfig::new(endpoint);
        if let Some(token) = &self.token {
            config = config.with_auth(AuthMethod::Bearer(token.clone()));
        }
        if let Some(timeout) = self.timeout_seconds {
            config = config.with_timeout(timeout);
        }
        for (key, value) in &self.headers {
            config = config.with_header(key, value);
        }

        Ok(config)
    }

    /// Service settings.
    pub fn service(&self) -> ServiceConfig {
        ServiceConfig::default().with_gas_limit(self.gas_limit.unwrap_or(DEFAULT_GAS_LIMIT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    #[test]
    fn it_loads_a_partial_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"endpoint": "https://ledger.example.com/v1", "gasLimit": 250000}"#,
        )?;

        let config = CliConfig::load(&path)?;

        assert_eq!(
            config.endpoint.as_ref().map(Url::as_str),
            Some("https://ledger.example.com/v1")
        );
        assert_eq!(config.service().gas_limit, 250_000);
        assert_eq!(config.token, None);

        Ok(())
    }

    #[test]
    fn it_prefers_overrides_to_the_file() -> TestResult {
        let file = CliConfig {
            endpoint: Some("https://ledger.example.com/v1".parse()?),
            token: Some("from-file".into()),
            gas_limit: Some(250_000),
            ..CliConfig::default()
        };
        let overrides = Overrides {
            token: Some("from-flag".into()),
            timeout: Some(5),
            ..Overrides::default()
        };

        let merged = file.merge(&overrides);
        let gateway = merged.gateway()?;

        assert_eq!(gateway.auth_method, AuthMethod::Bearer("from-flag".into()));
        assert_eq!(gateway.timeout_seconds, Some(5));
        assert_eq!(merged.service().gas_limit, 250_000);

        Ok(())
    }

    #[test]
    fn it_requires_an_endpoint() {
        assert!(CliConfig::default().gateway().is_err());
        assert_eq!(CliConfig::default().service(), ServiceConfig::default());
    }

    #[test]
    fn it_fails_on_a_missing_explicit_file() -> TestResult {
        let dir = tempfile::tempdir()?;

        assert!(CliConfig::discover(Some(&dir.path().join("absent.json"))).is_err());

        Ok(())
    }
}
