// # HTTP Transport Trait
//
// Defines the interface for executing a single HTTP exchange.
//
// ## Implementations
//
// - reqwest-based: `carelink-http` crate
// - Scripted mocks: contract tests in this crate
//
// ## Responsibility Boundary
//
// A transport executes exactly one request and reports what happened at the
// wire level. It must NOT:
// - Retry (owned by the `Dispatcher`)
// - Resolve or swap endpoints (owned by the `EndpointResolver`)
// - Attach or clear credentials (owned by the `Dispatcher` / `CredentialStore`)
// - Interpret HTTP status codes (owned by the `Dispatcher` decision table)
//
// Receiving an HTTP error status is a *successful* transport execution; only
// the absence of a response (DNS failure, refused connection, timeout) is a
// `TransportError`.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// HTTP method for a logical request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Wire-format method name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully composed request handed to the transport
///
/// The URL is absolute: base-URL resolution and path prefixing have already
/// happened by the time a transport sees it.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute request URL
    pub url: String,
    /// Header name/value pairs, in insertion order
    pub headers: Vec<(String, String)>,
    /// JSON body, if any
    pub body: Option<Value>,
    /// Bounded per-request timeout
    pub timeout: Duration,
}

/// A received HTTP response, regardless of status class
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8 text (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as arbitrary JSON, if it is JSON at all
    pub fn payload(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Body deserialized into a typed value
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, crate::ApiError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| crate::ApiError::other(format!("failed to decode response body: {}", e)))
    }
}

/// Failure to obtain any HTTP response
///
/// These are the network-class failures that trigger endpoint re-resolution
/// in the `Dispatcher`. `Other` covers transport-internal faults (e.g. a body
/// stream aborting mid-read) that are surfaced without retry.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// DNS failure, refused or dropped connection
    #[error("connection failed: {0}")]
    Connect(String),

    /// The bounded timeout elapsed before a response arrived
    #[error("timed out: {0}")]
    Timeout(String),

    /// Any other transport-level fault
    #[error("transport failure: {0}")]
    Other(String),
}

impl TransportError {
    /// Whether no response was received (eligible for the endpoint-swap retry)
    pub fn is_network_class(&self) -> bool {
        matches!(self, TransportError::Connect(_) | TransportError::Timeout(_))
    }
}

/// Trait for HTTP transport implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks; the
/// `Dispatcher` issues many concurrent requests through one transport.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute one HTTP exchange
    ///
    /// # Returns
    ///
    /// - `Ok(TransportResponse)`: A response was received, whatever its status
    /// - `Err(TransportError)`: No response was received
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
