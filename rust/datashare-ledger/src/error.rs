use thiserror::Error;

use crate::RegistryName;

/// Revert reasons emitted by the registries.
pub mod revert {
    /// The recipient already holds a token in this registry
    pub const ALREADY_AUTHORIZED: &str = "Address already has a token";

    /// The address holds no token in this registry
    pub const NO_TOKEN: &str = "Address does not have a token";

    /// The sender is not the registry owner
    pub const NOT_OWNER: &str = "Ownable: caller is not the owner";
}

/// Failures reported by a ledger gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The registry executed the transaction and rolled it back
    #[error("Transaction reverted: {}", reason.as_deref().unwrap_or("no reason given"))]
    Reverted {
        /// Revert reason, when the registry provided one
        reason: Option<String>,
    },

    /// The transaction needs more gas than its ceiling allows
    #[error("Out of gas: limit {limit}, required {required}")]
    OutOfGas {
        /// The ceiling the sender attached
        limit: u64,
        /// What execution would have needed
        required: u64,
    },

    /// The gateway refused to act on behalf of the sender
    #[error("Gateway denied the request: {reason}")]
    Denied {
        /// Explanation given by the gateway
        reason: String,
    },

    /// The gateway could not be reached; nothing was submitted
    #[error("Gateway unreachable: {0}")]
    Unreachable(String),

    /// The gateway did not answer in time; the request may have been applied
    #[error("Gateway timed out: {0}")]
    Timeout(String),

    /// The connection failed after the request was sent
    #[error("Gateway connection interrupted: {0}")]
    Interrupted(String),

    /// The gateway rejected the request at the protocol level
    #[error("Gateway rejected the request with status {status}: {reason}")]
    Rejected {
        /// Protocol status code
        status: u16,
        /// Explanation given by the gateway
        reason: String,
    },

    /// The gateway answered with something that could not be understood
    #[error("Malformed gateway response: {0}")]
    Malformed(String),

    /// The registry does not implement the requested operation
    #[error("Registry {registry} does not implement {method}")]
    UnsupportedOperation {
        /// The addressed registry
        registry: RegistryName,
        /// The requested method
        method: String,
    },
}

impl GatewayError {
    /// The reason supplied by the registry or gateway, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            GatewayError::Reverted { reason } => reason.as_deref(),
            GatewayError::Denied { reason } | GatewayError::Rejected { reason, .. } => {
                Some(reason)
            }
            _ => None,
        }
    }

    /// Whether the failure guarantees that no state changed on the ledger.
    ///
    /// Timeouts, interrupted connections and unreadable responses leave the
    /// outcome unknown: the transaction may have been applied.
    pub fn left_state_unchanged(&self) -> bool {
        !matches!(
            self,
            GatewayError::Timeout(_) | GatewayError::Interrupted(_) | GatewayError::Malformed(_)
        )
    }
}
