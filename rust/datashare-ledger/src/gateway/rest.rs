//! REST gateway implementation for a remote ledger

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use super::LedgerGateway;
use crate::{
    Address, ConditionalSync, GatewayError, Query, QueryOutput, Receipt, RegistryName,
    Transaction, TransactionOptions,
};

/// Authentication methods for REST gateway
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthMethod {
    /// No authentication
    #[default]
    None,

    /// Bearer token authentication
    ///
    /// Includes `Authorization: Bearer {token}` header in all requests
    Bearer(String),
}

/// Configuration for REST gateway
#[derive(Clone, Debug)]
pub struct RestGatewayConfig {
    /// Base URL of the gateway API (e.g., "https://ledger.example.com/v1")
    pub endpoint: Url,

    /// Authentication method
    pub auth_method: AuthMethod,

    /// Optional timeout for requests in seconds (default: 30)
    pub timeout_seconds: Option<u64>,

    /// Optional custom headers to send with each request
    pub headers: Vec<(String, String)>,
}

impl RestGatewayConfig {
    /// Create a new REST gateway configuration
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            auth_method: AuthMethod::None,
            timeout_seconds: Some(30),
            headers: Vec::new(),
        }
    }

    /// Set the authentication method
    pub fn with_auth(mut self, auth_method: AuthMethod) -> Self {
        self.auth_method = auth_method;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// Body of a `send` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    /// The initiating identity
    pub from: Address,
    /// Gas ceiling
    pub gas: u64,
    /// The transaction to submit
    pub transaction: Transaction,
}

/// Error body returned by the gateway on non-success statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human readable reason, e.g. the registry's revert reason
    #[serde(default)]
    pub reason: Option<String>,
    /// Gas required, reported with out-of-gas failures
    #[serde(default)]
    pub required: Option<u64>,
}

/// REST ledger gateway
///
/// Speaks a small JSON protocol:
/// - POST `{endpoint}/registries/{registry}/send` - submit a [`SendRequest`], answers a [`Receipt`]
/// - POST `{endpoint}/registries/{registry}/call` - run a [`Query`], answers a [`QueryOutput`]
///
/// Non-success statuses are mapped onto [`GatewayError`]:
/// `409`/`422` are reverts, `401`/`403` are denials, `402` means the gas
/// ceiling was too low, and anything else is a protocol level rejection.
///
/// # Examples
///
/// ```no_run
/// use datashare_ledger::{AuthMethod, LedgerGateway, Query, RegistryName, RestGateway, RestGatewayConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RestGatewayConfig::new("https://ledger.example.com/v1".parse()?)
///     .with_auth(AuthMethod::Bearer("my-token".to_string()))
///     .with_timeout(60);
///
/// let gateway = RestGateway::new(config);
/// let policies = gateway
///     .call(RegistryName::DataAnalyzers, Query::GetAllAccessPolicies)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RestGateway {
    config: RestGatewayConfig,
    client: Client,
}

impl RestGateway {
    /// Create a new REST gateway with the given configuration
    pub fn new(config: RestGatewayConfig) -> Self {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout_seconds {
            client_builder = client_builder.timeout(std::time::Duration::from_secs(timeout));
        }

        let client = client_builder.build().unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    /// The URL of `operation` ("send" or "call") on `registry`.
    fn url_for(&self, registry: RegistryName, operation: &str) -> String {
        format!(
            "{}/registries/{}/{}",
            self.config.endpoint.as_str().trim_end_matches('/'),
            registry,
            operation
        )
    }

    /// Build a request with authentication and custom headers
    fn build_request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut builder = builder;

        match &self.config.auth_method {
            AuthMethod::None => {}
            AuthMethod::Bearer(token) => {
                builder = builder.bearer_auth(token);
            }
        }

        for (key, value) in &self.config.headers {
            builder = builder.header(key, value);
        }

        builder
    }

    async fn post<B, T>(&self, url: String, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized + ConditionalSync,
        T: for<'de> Deserialize<'de>,
    {
        let request = self.build_request(self.client.post(&url).json(body));
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        response
            .json::<T>()
            .await
            .map_err(|error| GatewayError::Malformed(format!("{url}: {error}")))
    }
}

fn transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout(error.to_string())
    } else if error.is_connect() || error.is_builder() {
        GatewayError::Unreachable(error.to_string())
    } else {
        GatewayError::Interrupted(error.to_string())
    }
}

/// Map a non-success HTTP status and its error body onto a [`GatewayError`].
pub fn classify_status(status: StatusCode, body: ErrorBody) -> GatewayError {
    let reason = || {
        body.reason
            .clone()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string())
    };

    match status {
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => GatewayError::Reverted {
            reason: body.reason.clone(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Denied { reason: reason() },
        StatusCode::PAYMENT_REQUIRED => GatewayError::OutOfGas {
            limit: 0,
            required: body.required.unwrap_or_default(),
        },
        // 408 lands in `Rejected`: the request was never handled
        StatusCode::GATEWAY_TIMEOUT => GatewayError::Timeout(reason()),
        _ => GatewayError::Rejected {
            status: status.as_u16(),
            reason: reason(),
        },
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl LedgerGateway for RestGateway {
    async fn send(
        &self,
        registry: RegistryName,
        transaction: Transaction,
        options: TransactionOptions,
    ) -> Result<Receipt, GatewayError> {
        let gas = options.gas;
        let body = SendRequest {
            from: options.from,
            gas,
            transaction,
        };

        self.post(self.url_for(registry, "send"), &body)
            .await
            .map_err(|error| match error {
                GatewayError::OutOfGas { required, .. } => GatewayError::OutOfGas {
                    limit: gas,
                    required,
                },
                other => other,
            })
    }

    async fn call(&self, registry: RegistryName, query: Query) -> Result<QueryOutput, GatewayError> {
        self.post(self.url_for(registry, "call"), &query).await
    }
}
