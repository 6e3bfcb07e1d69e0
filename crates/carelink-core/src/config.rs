//! Configuration types for the carelink access layer
//!
//! Configuration is read once at process start and drives candidate
//! ordering, timeouts, and the credential store backing. Defaults match the
//! behavior of the shipped client: 30s request timeout, 3s probe timeout,
//! 5-minute endpoint cache, 10s connectivity poll, one automatic retry for
//! network-class failures.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::resolver::{CandidateSource, EndpointCandidate};

/// Main configuration for the access layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Endpoint discovery configuration
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Request dispatch configuration
    #[serde(default)]
    pub request: RequestConfig,

    /// Connectivity monitoring configuration
    #[serde(default)]
    pub connectivity: ConnectivityConfig,

    /// Credential store configuration
    #[serde(default)]
    pub credential_store: CredentialStoreConfig,
}

impl ClientConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            request: RequestConfig::default(),
            connectivity: ConnectivityConfig::default(),
            credential_store: CredentialStoreConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::ApiError> {
        self.endpoint.validate()?;
        if self.request.timeout_secs == 0 {
            return Err(crate::ApiError::config("request timeout must be > 0"));
        }
        if self.connectivity.poll_interval_secs == 0 {
            return Err(crate::ApiError::config(
                "connectivity poll interval must be > 0",
            ));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Endpoint discovery configuration
///
/// The candidate order is fixed: operator override, production, emulator
/// loopback addresses, LAN probe addresses, final fallback. An override
/// always wins and skips probing entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Operator-supplied override; skips discovery when set
    #[serde(default)]
    pub override_url: Option<String>,

    /// Deployed production base URL
    #[serde(default)]
    pub production_url: Option<String>,

    /// Platform-local addresses tried before the LAN (emulator loopback,
    /// developer machine)
    #[serde(default = "default_loopback_urls")]
    pub loopback_urls: Vec<String>,

    /// LAN addresses a development backend commonly binds to
    #[serde(default)]
    pub lan_urls: Vec<String>,

    /// Used when every probe fails and no last-known-good endpoint exists
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,

    /// Per-candidate probe timeout (seconds)
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// How long a resolved endpoint stays fresh (seconds)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl EndpointConfig {
    /// Validate every configured URL
    pub fn validate(&self) -> Result<(), crate::ApiError> {
        let urls = self
            .override_url
            .iter()
            .chain(self.production_url.iter())
            .chain(self.loopback_urls.iter())
            .chain(self.lan_urls.iter())
            .chain(std::iter::once(&self.fallback_url));
        for url in urls {
            Url::parse(url)
                .map_err(|e| crate::ApiError::config(format!("invalid URL {}: {}", url, e)))?;
        }
        if self.probe_timeout_secs == 0 {
            return Err(crate::ApiError::config("probe timeout must be > 0"));
        }
        Ok(())
    }

    /// Build the ordered candidate list for discovery
    pub fn candidates(&self) -> Vec<EndpointCandidate> {
        let mut candidates = Vec::new();
        if let Some(url) = &self.override_url {
            candidates.push(EndpointCandidate::new(url, CandidateSource::Override));
        }
        if let Some(url) = &self.production_url {
            candidates.push(EndpointCandidate::new(url, CandidateSource::Production));
        }
        for url in &self.loopback_urls {
            candidates.push(EndpointCandidate::new(
                url,
                CandidateSource::EmulatorLoopback,
            ));
        }
        for url in &self.lan_urls {
            candidates.push(EndpointCandidate::new(url, CandidateSource::LanProbe));
        }
        candidates.push(EndpointCandidate::new(
            &self.fallback_url,
            CandidateSource::Fallback,
        ));
        candidates
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            override_url: None,
            production_url: None,
            loopback_urls: default_loopback_urls(),
            lan_urls: Vec::new(),
            fallback_url: default_fallback_url(),
            probe_timeout_secs: default_probe_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Request dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Bounded per-request timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay before the single endpoint-swap retry (milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_request_timeout_secs(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Connectivity monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// Poll interval for connectivity checks (seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// URL the HTTP reachability source checks
    #[serde(default = "default_reachability_url")]
    pub reachability_url: String,

    /// Timeout for one reachability check (seconds)
    #[serde(default = "default_reachability_timeout_secs")]
    pub check_timeout_secs: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            reachability_url: default_reachability_url(),
            check_timeout_secs: default_reachability_timeout_secs(),
        }
    }
}

/// Credential store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialStoreConfig {
    /// File-based store (JSON, atomic writes)
    File {
        /// Path to the credential file
        path: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,
}

fn default_loopback_urls() -> Vec<String> {
    // 10.0.2.2 is the host loopback as seen from the Android emulator
    vec![
        "http://10.0.2.2:8000".to_string(),
        "http://localhost:8000".to_string(),
    ]
}

fn default_fallback_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    3
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_reachability_url() -> String {
    "https://connectivitycheck.gstatic.com/generate_204".to_string()
}

fn default_reachability_timeout_secs() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ClientConfig::default().validate().expect("defaults valid");
    }

    #[test]
    fn candidate_order_is_override_production_loopback_lan_fallback() {
        let config = EndpointConfig {
            override_url: Some("http://192.168.1.50:8000".to_string()),
            production_url: Some("https://api.example.org".to_string()),
            loopback_urls: vec!["http://10.0.2.2:8000".to_string()],
            lan_urls: vec!["http://192.168.1.100:8000".to_string()],
            ..EndpointConfig::default()
        };

        let sources: Vec<_> = config.candidates().iter().map(|c| c.source).collect();
        assert_eq!(
            sources,
            vec![
                CandidateSource::Override,
                CandidateSource::Production,
                CandidateSource::EmulatorLoopback,
                CandidateSource::LanProbe,
                CandidateSource::Fallback,
            ]
        );
    }

    #[test]
    fn invalid_url_is_rejected() {
        let config = EndpointConfig {
            production_url: Some("not a url".to_string()),
            ..EndpointConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_probe_timeout_is_rejected() {
        let config = EndpointConfig {
            probe_timeout_secs: 0,
            ..EndpointConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
