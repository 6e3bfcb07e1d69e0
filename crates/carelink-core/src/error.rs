//! Error types for the carelink access layer
//!
//! Every failure path in the crate is normalized into [`ApiError`] before it
//! reaches a caller. The variants mirror the error taxonomy consumers key on:
//! network-class failures (recoverable by endpoint re-resolution), timeouts,
//! HTTP status classes, authentication failures, and a catch-all.

use serde_json::Value;
use thiserror::Error;

/// Result type alias for carelink operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Coarse error classification exposed to callers.
///
/// UI layers render messages from this kind plus the attached status and
/// payload, without inspecting transport internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No HTTP response was received (DNS/connection failure)
    Network,
    /// The request exceeded its bounded timeout
    Timeout,
    /// HTTP 4xx other than 401
    Http4xx,
    /// HTTP 5xx
    Http5xx,
    /// HTTP 401; stored credentials have been cleared
    Unauthorized,
    /// Anything that does not fit the above
    Unknown,
}

/// Normalized error for the carelink access layer
///
/// Errors are `Clone` so a single initialization or discovery failure can be
/// surfaced to every waiter sharing the in-flight operation.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// No response was received: DNS failure, refused connection, dead endpoint
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out before a response arrived
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The server rejected the credentials (HTTP 401)
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Server-provided detail, if any
        message: String,
        /// Parsed response body, if it was JSON
        payload: Option<Value>,
    },

    /// HTTP 4xx other than 401
    #[error("client error ({status}): {message}")]
    Client {
        /// HTTP status code
        status: u16,
        /// Server-provided detail, if any
        message: String,
        /// Parsed response body, if it was JSON
        payload: Option<Value>,
    },

    /// HTTP 5xx
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Server-provided detail, if any
        message: String,
        /// Parsed response body, if it was JSON
        payload: Option<Value>,
    },

    /// Configuration errors (invalid URLs, missing required values)
    #[error("configuration error: {0}")]
    Config(String),

    /// Credential store backend failures
    #[error("credential store error: {0}")]
    CredentialStore(String),

    /// Generic error with the original message preserved
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Create a network-class error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>, payload: Option<Value>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            payload,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a credential store error
    pub fn credential_store(msg: impl Into<String>) -> Self {
        Self::CredentialStore(msg.into())
    }

    /// Create a catch-all error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// The coarse classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Client { .. } => ErrorKind::Http4xx,
            Self::Server { .. } => ErrorKind::Http5xx,
            Self::Config(_) | Self::CredentialStore(_) | Self::Other(_) => ErrorKind::Unknown,
        }
    }

    /// The HTTP status this error carries, if a response was received
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The parsed response payload this error carries, if any
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Unauthorized { payload, .. }
            | Self::Client { payload, .. }
            | Self::Server { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }

    /// Whether this failure is recoverable by re-resolving the endpoint
    ///
    /// Only failures where no HTTP response was received qualify; HTTP error
    /// statuses (including 5xx) are never retried automatically.
    pub fn is_network_class(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

/// Helper for converting anyhow::Error to our error type
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(format!("JSON error: {}", err))
    }
}
