// # HTTP Reachability Source
//
// Samples connectivity by fetching a well-known URL (a captive-portal style
// generate_204 endpoint by default).
//
// ## Semantics
//
// Any HTTP response means the internet answered; the transport kind is
// unknown at this level. A failed fetch reports the offline state rather
// than an error, so a flaky check degrades gracefully in the monitor.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use carelink_core::traits::{ConnectivityState, NetworkStateSource, TransportKind};

/// `NetworkStateSource` backed by an HTTP reachability check
pub struct HttpReachabilitySource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpReachabilitySource {
    /// Create a source checking the given URL with the given timeout
    pub fn new(url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder().build().unwrap_or_default(),
            url,
            timeout,
        }
    }
}

#[async_trait]
impl NetworkStateSource for HttpReachabilitySource {
    async fn check(&self) -> carelink_core::Result<ConnectivityState> {
        match self.client.get(&self.url).timeout(self.timeout).send().await {
            Ok(response) => {
                debug!("reachability check got {} from {}", response.status(), self.url);
                Ok(ConnectivityState::online(TransportKind::Unknown))
            }
            Err(e) => {
                debug!("reachability check failed for {}: {}", self.url, e);
                Ok(ConnectivityState::offline())
            }
        }
    }
}
