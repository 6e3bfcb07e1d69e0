// # Reqwest Liveness Probe
//
// Answers "does this base URL host a live backend" for endpoint discovery.
//
// ## Semantics
//
// A short GET is tried against a small set of paths in order. Any HTTP
// response with a status below 500 counts as reachable: a 404 or a 401
// still proves a server is answering at that address. Connection failures
// and timeouts move on to the next path; only when every path fails is the
// base URL unreachable.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use carelink_core::traits::{LivenessProbe, ProbeOutcome};

/// Paths tried per candidate, cheapest first
const LIVENESS_PATHS: &[&str] = &["/health/", "/api/", "/"];

/// `LivenessProbe` backed by reqwest
pub struct ReqwestProber {
    client: reqwest::Client,
}

impl ReqwestProber {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder().build().unwrap_or_default(),
        }
    }
}

impl Default for ReqwestProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LivenessProbe for ReqwestProber {
    async fn probe(&self, base_url: &str, timeout: Duration) -> ProbeOutcome {
        for path in LIVENESS_PATHS {
            let url = format!("{}{}", base_url, path);
            match self.client.get(&url).timeout(timeout).send().await {
                Ok(response) if response.status().as_u16() < 500 => {
                    debug!("probe hit {} ({})", url, response.status());
                    return ProbeOutcome::Reachable;
                }
                Ok(response) => {
                    debug!("probe got {} from {}", response.status(), url);
                }
                Err(e) => {
                    debug!("probe failed for {}: {}", url, e);
                }
            }
        }
        ProbeOutcome::Unreachable
    }
}
