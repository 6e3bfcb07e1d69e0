//! Request dispatcher
//!
//! The dispatcher issues HTTP calls on behalf of the application. Every call:
//! - resolves the current base URL through the [`EndpointResolver`]
//! - composes `base + api/ + path` with the prefix applied idempotently
//! - attaches `Authorization: Bearer <token>` when a token is stored and the
//!   request wants auth
//! - executes with a bounded timeout
//! - classifies the outcome through an explicit decision table
//!
//! ## Failure handling
//!
//! Classification drives recovery, not ad hoc exception inspection:
//! - network-class failure (no response received) → invalidate the endpoint,
//!   re-resolve, and retry the identical request exactly once if the fresh
//!   base URL differs from the one just used
//! - HTTP 401 → clear stored credentials, surface `Unauthorized`, no retry
//! - other 4xx / 5xx → surface as-is, no retry
//!
//! Retry lives here and only here; transports execute single exchanges.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::RequestConfig;
use crate::error::{ApiError, Result};
use crate::resolver::EndpointResolver;
use crate::traits::{
    CredentialStore, HttpTransport, Method, TransportError, TransportRequest, TransportResponse,
};

/// Well-known path prefix every request is mounted under
const API_PREFIX: &str = "api";

/// Per-request options
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Attach the stored access token, if one exists
    pub requires_auth: bool,
    /// Override the configured request timeout
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Options for authentication endpoints: same `api/` prefix, no token
    pub fn unauthenticated() -> Self {
        Self {
            requires_auth: false,
            timeout: None,
        }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            requires_auth: true,
            timeout: None,
        }
    }
}

/// A non-error (2xx–3xx) response returned to the caller
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Body as UTF-8 text (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as arbitrary JSON, if it is JSON at all
    pub fn payload(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Body deserialized into a typed value
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::other(format!("failed to decode response body: {}", e)))
    }
}

impl From<TransportResponse> for ApiResponse {
    fn from(response: TransportResponse) -> Self {
        Self {
            status: response.status,
            body: response.body,
        }
    }
}

/// Issues HTTP calls with endpoint resolution, auth injection, error
/// normalization, and the single endpoint-swap retry
pub struct Dispatcher {
    transport: Box<dyn HttpTransport>,
    resolver: EndpointResolver,
    credentials: Arc<dyn CredentialStore>,
    request_timeout: Duration,
    retry_delay: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("request_timeout", &self.request_timeout)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher
    pub fn new(
        transport: Box<dyn HttpTransport>,
        resolver: EndpointResolver,
        credentials: Arc<dyn CredentialStore>,
        config: &RequestConfig,
    ) -> Self {
        Self {
            transport,
            resolver,
            credentials,
            request_timeout: Duration::from_secs(config.timeout_secs),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// The resolver backing this dispatcher
    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    /// The credential store backing this dispatcher
    ///
    /// Login/logout flows write tokens here directly after their own HTTP
    /// exchange completes.
    pub fn credentials(&self) -> Arc<dyn CredentialStore> {
        Arc::clone(&self.credentials)
    }

    /// GET a path
    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::Get, path, None, RequestOptions::default())
            .await
    }

    /// POST a JSON body to a path
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.request(
            Method::Post,
            path,
            Some(to_json(body)?),
            RequestOptions::default(),
        )
        .await
    }

    /// PUT a JSON body to a path
    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.request(
            Method::Put,
            path,
            Some(to_json(body)?),
            RequestOptions::default(),
        )
        .await
    }

    /// PATCH a path with a JSON body
    pub async fn patch<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.request(
            Method::Patch,
            path,
            Some(to_json(body)?),
            RequestOptions::default(),
        )
        .await
    }

    /// DELETE a path
    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::Delete, path, None, RequestOptions::default())
            .await
    }

    /// Issue a logical request
    ///
    /// This is the collaborator-facing entry point; the method sugar above
    /// delegates here.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let base = self.resolver.base_url().await;
        let url = compose_url(&base, path);

        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        if options.requires_auth {
            if let Some(token) = self.credentials.access_token().await {
                headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
            }
        }

        let request = TransportRequest {
            method,
            url,
            headers,
            body,
            timeout: options.timeout.unwrap_or(self.request_timeout),
        };

        debug!("{} {}", method, request.url);
        match self.transport.execute(request.clone()).await {
            Ok(response) => self.classify(response).await,
            Err(err) if err.is_network_class() => {
                self.retry_after_swap(request, path, &base, err).await
            }
            Err(err) => Err(ApiError::other(err.to_string())),
        }
    }

    /// Network-class recovery: re-resolve the endpoint and retry once
    ///
    /// The retry only happens when discovery lands on a different base URL;
    /// re-sending the identical request at the endpoint that just failed
    /// would only double the latency of the same failure.
    async fn retry_after_swap(
        &self,
        request: TransportRequest,
        path: &str,
        used_base: &str,
        original: TransportError,
    ) -> Result<ApiResponse> {
        warn!(
            "network-class failure on {} ({}), re-resolving endpoint",
            request.url, original
        );

        self.resolver.invalidate().await;
        tokio::time::sleep(self.retry_delay).await;
        let fresh_base = self.resolver.base_url().await;

        if fresh_base == used_base {
            debug!("re-resolution returned the same endpoint, not retrying");
            return Err(normalize_transport(original));
        }

        let retry = TransportRequest {
            url: compose_url(&fresh_base, path),
            ..request
        };

        debug!("retrying {} {} against fresh endpoint", retry.method, retry.url);
        match self.transport.execute(retry).await {
            Ok(response) => self.classify(response).await,
            Err(err) => Err(normalize_transport(err)),
        }
    }

    /// The decision table: status class → outcome
    async fn classify(&self, response: TransportResponse) -> Result<ApiResponse> {
        let status = response.status;
        match status {
            200..=399 => Ok(response.into()),
            401 => {
                warn!("received 401, clearing stored credentials");
                self.credentials.clear().await;
                let payload = response.payload();
                Err(ApiError::unauthorized(
                    extract_message(&payload, status),
                    payload,
                ))
            }
            400..=499 => {
                let payload = response.payload();
                Err(ApiError::Client {
                    status,
                    message: extract_message(&payload, status),
                    payload,
                })
            }
            500..=599 => {
                let payload = response.payload();
                Err(ApiError::Server {
                    status,
                    message: extract_message(&payload, status),
                    payload,
                })
            }
            _ => Err(ApiError::other(format!("unexpected HTTP status {}", status))),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(body: &T) -> Result<Value> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::other(format!("failed to encode request body: {}", e)))
}

fn normalize_transport(err: TransportError) -> ApiError {
    match err {
        TransportError::Timeout(msg) => ApiError::timeout(msg),
        TransportError::Connect(msg) => ApiError::network(msg),
        TransportError::Other(msg) => ApiError::other(msg),
    }
}

/// Best server-provided message from a JSON payload, mirroring the backend's
/// `detail` / `message` fields
fn extract_message(payload: &Option<Value>, status: u16) -> String {
    payload
        .as_ref()
        .and_then(|p| {
            p.get("detail")
                .or_else(|| p.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP error status {}", status))
}

/// Compose `base + api/ + path` with exactly one prefix and single slashes
///
/// Idempotent in both directions: a base URL already ending in `/api` and a
/// path already carrying the `api/` prefix each contribute the prefix once.
/// The caller's trailing slash is preserved (the backend routes with them).
fn compose_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let root = base.strip_suffix("/api").unwrap_or(base);

    let mut rest = path.trim_start_matches('/');
    if rest == API_PREFIX {
        rest = "";
    } else if let Some(stripped) = rest.strip_prefix("api/") {
        rest = stripped;
    }
    let rest = rest.trim_start_matches('/');

    if rest.is_empty() {
        format!("{}/{}/", root, API_PREFIX)
    } else {
        format!("{}/{}/{}", root, API_PREFIX, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_applied_once() {
        assert_eq!(
            compose_url("http://localhost:8000", "/hospitals/"),
            "http://localhost:8000/api/hospitals/"
        );
        assert_eq!(
            compose_url("http://localhost:8000", "api/hospitals/"),
            "http://localhost:8000/api/hospitals/"
        );
    }

    #[test]
    fn prefixed_path_and_prefixed_base_compose_identically() {
        let combos = [
            ("http://h:8000", "api/hospitals/"),
            ("http://h:8000", "/hospitals/"),
            ("http://h:8000/", "//hospitals/"),
            ("http://h:8000/api", "hospitals/"),
            ("http://h:8000/api/", "/api/hospitals/"),
        ];
        for (base, path) in combos {
            assert_eq!(
                compose_url(base, path),
                "http://h:8000/api/hospitals/",
                "base={base} path={path}"
            );
        }
    }

    #[test]
    fn empty_path_hits_the_prefix_root() {
        assert_eq!(compose_url("http://h:8000", ""), "http://h:8000/api/");
        assert_eq!(compose_url("http://h:8000", "/"), "http://h:8000/api/");
        assert_eq!(compose_url("http://h:8000", "api"), "http://h:8000/api/");
    }

    #[test]
    fn trailing_slash_of_the_path_is_preserved() {
        assert_eq!(
            compose_url("http://h:8000", "hospitals"),
            "http://h:8000/api/hospitals"
        );
        assert_eq!(
            compose_url("http://h:8000", "users/login/"),
            "http://h:8000/api/users/login/"
        );
    }

    #[test]
    fn query_strings_pass_through() {
        assert_eq!(
            compose_url("http://h:8000", "hospitals/?search=mbarara"),
            "http://h:8000/api/hospitals/?search=mbarara"
        );
    }

    #[test]
    fn message_extraction_prefers_detail_then_message() {
        let detail = Some(serde_json::json!({"detail": "no such hospital"}));
        assert_eq!(extract_message(&detail, 404), "no such hospital");

        let message = Some(serde_json::json!({"message": "bad input"}));
        assert_eq!(extract_message(&message, 400), "bad input");

        let neither = Some(serde_json::json!({"items": []}));
        assert_eq!(extract_message(&neither, 418), "HTTP error status 418");
        assert_eq!(extract_message(&None, 500), "HTTP error status 500");
    }
}
