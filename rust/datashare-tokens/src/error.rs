use datashare_ledger::{Address, AddressError, GatewayError, Receipt, UnknownRegistry};
use serde::Serialize;
use thiserror::Error;

/// Reason reported when a rejected issuance carries no usable explanation.
pub const GENERIC_ISSUANCE_REASON: &str = "already authorized or invalid";

/// What a failed operation did to ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StateEffect {
    /// Nothing changed; the operation was rejected before taking effect
    Unchanged,
    /// The operation may or may not have taken effect
    Unknown,
}

/// Input rejected locally, before anything was sent to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    /// The registry name is not hosted by the ledger
    #[error(transparent)]
    UnknownRegistry(#[from] UnknownRegistry),

    /// An identity is not a well-formed address
    #[error("Malformed {field}: {source}")]
    MalformedAddress {
        /// Which argument was malformed
        field: &'static str,
        /// Why the address was rejected
        source: AddressError,
    },

    /// An identity is the reserved zero address
    #[error("The zero address cannot be used as {field}")]
    ZeroAddress {
        /// Which argument was the zero address
        field: &'static str,
    },

    /// An access policy label is not usable
    #[error("Malformed access policy {label:?}: {reason}")]
    MalformedPolicy {
        /// The rejected label
        label: String,
        /// Why it was rejected
        reason: &'static str,
    },
}

/// Coarse classification of a [`CredentialError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// See [`CredentialError::InvalidInput`]
    InvalidInput,
    /// See [`CredentialError::Transport`]
    TransportError,
    /// See [`CredentialError::NoCredential`]
    NoCredential,
    /// See [`CredentialError::AlreadyAuthorized`]
    AlreadyAuthorized,
    /// See [`CredentialError::Unauthorized`]
    Unauthorized,
}

/// Failures of credential and access policy operations.
///
/// Every gateway failure is normalized into one of these variants. The
/// gateway's own error is kept as the [`std::error::Error::source`] for
/// diagnostics, but the variant alone is enough to decide what to do next.
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    /// Input was rejected before contacting the ledger
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// The ledger could not be reached, refused the request at the protocol
    /// level, or answered in a way that does not establish the outcome
    #[error("Transport failure: {reason}")]
    Transport {
        /// Description of the failure
        reason: String,
        /// Whether ledger state may have changed
        effect: StateEffect,
        /// The gateway failure, when there was one
        #[source]
        cause: Option<GatewayError>,
    },

    /// The subject holds no credential for the role
    #[error("No active credential for {subject}")]
    NoCredential {
        /// The identity that was looked up or revoked
        subject: Address,
        /// The gateway failure, when the ledger rejected a revocation
        #[source]
        cause: Option<GatewayError>,
    },

    /// The subject already holds a credential for the role, or the issuance
    /// was otherwise invalid
    #[error("Cannot issue a credential to {subject}: {reason}")]
    AlreadyAuthorized {
        /// The identity that was to receive the credential
        subject: Address,
        /// The ledger's reason, or [`GENERIC_ISSUANCE_REASON`]
        reason: String,
        /// The gateway failure
        #[source]
        cause: GatewayError,
    },

    /// The initiator lacks authority for the operation
    #[error("{initiator} is not permitted to perform this operation: {reason}")]
    Unauthorized {
        /// The identity that initiated the operation
        initiator: Address,
        /// The ledger's reason
        reason: String,
        /// The gateway failure
        #[source]
        cause: GatewayError,
    },
}

impl CredentialError {
    /// Coarse classification of this failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            CredentialError::InvalidInput(_) => FailureKind::InvalidInput,
            CredentialError::Transport { .. } => FailureKind::TransportError,
            CredentialError::NoCredential { .. } => FailureKind::NoCredential,
            CredentialError::AlreadyAuthorized { .. } => FailureKind::AlreadyAuthorized,
            CredentialError::Unauthorized { .. } => FailureKind::Unauthorized,
        }
    }

    /// What the failed operation did to ledger state. Only transport failures
    /// can leave the outcome unknown; every other failure is a rejection.
    pub fn effect(&self) -> StateEffect {
        match self {
            CredentialError::Transport { effect, .. } => *effect,
            _ => StateEffect::Unchanged,
        }
    }

    /// Whether repeating the operation is safe and might succeed: the
    /// transport failed before anything changed on the ledger. An answer the
    /// ledger gave but this layer cannot use is never retryable, since asking
    /// again yields the same answer.
    pub fn is_retryable(&self) -> bool {
        match self {
            CredentialError::Transport {
                effect: StateEffect::Unchanged,
                cause: Some(cause),
                ..
            } => !matches!(cause, GatewayError::Malformed(_)),
            _ => false,
        }
    }

    /// The underlying gateway failure, if any.
    pub fn cause(&self) -> Option<&GatewayError> {
        match self {
            CredentialError::InvalidInput(_) => None,
            CredentialError::Transport { cause, .. } | CredentialError::NoCredential { cause, .. } => {
                cause.as_ref()
            }
            CredentialError::AlreadyAuthorized { cause, .. }
            | CredentialError::Unauthorized { cause, .. } => Some(cause),
        }
    }

    pub(crate) fn no_credential(subject: Address) -> Self {
        CredentialError::NoCredential {
            subject,
            cause: None,
        }
    }

    /// A gateway failure that is not a business rejection.
    pub(crate) fn transport(cause: GatewayError) -> Self {
        let effect = if cause.left_state_unchanged() {
            StateEffect::Unchanged
        } else {
            StateEffect::Unknown
        };

        CredentialError::Transport {
            reason: cause.to_string(),
            effect,
            cause: Some(cause),
        }
    }

    /// A failed read. Reads never change state, whatever happened in transit.
    pub(crate) fn failed_read(cause: GatewayError) -> Self {
        CredentialError::Transport {
            reason: cause.to_string(),
            effect: StateEffect::Unchanged,
            cause: Some(cause),
        }
    }

    /// The ledger answered a read with something other than what was asked.
    pub(crate) fn unexpected_answer(method: &str, answer: impl std::fmt::Debug) -> Self {
        CredentialError::Transport {
            reason: format!("Malformed response to {method}: {answer:?}"),
            effect: StateEffect::Unchanged,
            cause: None,
        }
    }

    /// A receipt that does not establish the outcome of a write.
    pub(crate) fn inconclusive(receipt: &Receipt, reason: &str) -> Self {
        CredentialError::Transport {
            reason: format!("Transaction {}: {reason}", receipt.transaction_hash),
            effect: StateEffect::Unknown,
            cause: None,
        }
    }

    /// Normalize a failed issuance. A revert without a reason is the
    /// registry's plain refusal and is read as "already authorized or
    /// invalid"; a revert whose reason is not recognized stays a transport
    /// failure.
    pub(crate) fn rejected_issuance(
        initiator: &Address,
        subject: &Address,
        cause: GatewayError,
    ) -> Self {
        match Rejection::of(&cause) {
            Some(Rejection::NotPermitted) => CredentialError::Unauthorized {
                initiator: initiator.clone(),
                reason: reason_or(&cause, "caller lacks authority"),
                cause,
            },
            Some(Rejection::AlreadyHeld | Rejection::Unexplained) => {
                CredentialError::AlreadyAuthorized {
                    subject: subject.clone(),
                    reason: reason_or(&cause, GENERIC_ISSUANCE_REASON),
                    cause,
                }
            }
            Some(Rejection::NoToken) | None => CredentialError::transport(cause),
        }
    }

    /// Normalize a failed revocation.
    pub(crate) fn rejected_revocation(
        initiator: &Address,
        subject: &Address,
        cause: GatewayError,
    ) -> Self {
        match Rejection::of(&cause) {
            Some(Rejection::NotPermitted) => CredentialError::Unauthorized {
                initiator: initiator.clone(),
                reason: reason_or(&cause, "caller lacks authority"),
                cause,
            },
            Some(Rejection::NoToken) => CredentialError::NoCredential {
                subject: subject.clone(),
                cause: Some(cause),
            },
            Some(Rejection::AlreadyHeld | Rejection::Unexplained) | None => {
                CredentialError::transport(cause)
            }
        }
    }

    /// Normalize a failed administrative reset.
    pub(crate) fn rejected_reset(initiator: &Address, cause: GatewayError) -> Self {
        match Rejection::of(&cause) {
            Some(Rejection::NotPermitted) => CredentialError::Unauthorized {
                initiator: initiator.clone(),
                reason: reason_or(&cause, "caller lacks authority"),
                cause,
            },
            _ => CredentialError::transport(cause),
        }
    }
}

/// Log a normalized failure together with its underlying cause.
pub(crate) fn report(method: &str, error: &CredentialError) {
    tracing::warn!(
        method,
        kind = ?error.kind(),
        retryable = error.is_retryable(),
        cause = ?error.cause(),
        "{error}"
    );
}

fn reason_or(cause: &GatewayError, fallback: &str) -> String {
    cause
        .reason()
        .filter(|reason| !reason.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Business rejections recognizable from a gateway failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    AlreadyHeld,
    NoToken,
    NotPermitted,
    /// A revert that gave no reason
    Unexplained,
}

impl Rejection {
    fn of(cause: &GatewayError) -> Option<Self> {
        match cause {
            GatewayError::Denied { .. } => Some(Rejection::NotPermitted),
            GatewayError::Reverted {
                reason: Some(reason),
            } if !reason.trim().is_empty() => Self::from_reason(reason),
            GatewayError::Reverted { .. } => Some(Rejection::Unexplained),
            _ => None,
        }
    }

    fn from_reason(reason: &str) -> Option<Self> {
        let reason = reason.to_ascii_lowercase();
        let mentions = |needles: &[&str]| needles.iter().any(|needle| reason.contains(needle));

        if mentions(&["not the owner", "not owner", "caller is not", "access denied"]) {
            Some(Rejection::NotPermitted)
        } else if mentions(&["already"]) {
            Some(Rejection::AlreadyHeld)
        } else if mentions(&["does not have a token", "no token", "nonexistent token"]) {
            Some(Rejection::NoToken)
        } else {
            None
        }
    }
}
