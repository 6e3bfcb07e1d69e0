//! Endpoint resolver
//!
//! The resolver owns the answer to "which backend do we talk to right now".
//! The environment changes underneath the client (emulator vs. device vs.
//! production, developer machines moving between networks), so the base URL
//! is discovered rather than configured: an ordered candidate list is probed
//! and the first reachable candidate wins.
//!
//! ## Discovery
//!
//! 1. An operator override always wins and is never probed.
//! 2. Otherwise candidates are probed in order (production, emulator
//!    loopback, LAN, fallback) with a short per-candidate timeout; the first
//!    one that answers is selected and probing stops.
//! 3. If nothing answers, the last endpoint that ever passed a probe is
//!    reused; failing that, the final fallback candidate is selected and the
//!    result is marked low-confidence.
//!
//! ## Concurrency
//!
//! At most one discovery runs at a time. Callers that race `base_url()`
//! while a discovery is in flight queue on the discovery lock and observe
//! the freshly cached result instead of launching duplicate probe rounds.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::traits::LivenessProbe;

/// Where a candidate base URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    /// Operator-supplied override; wins unconditionally
    Override,
    /// Deployed production backend
    Production,
    /// Emulator/host loopback address
    EmulatorLoopback,
    /// LAN address a development backend commonly binds to
    LanProbe,
    /// Final fallback when nothing answers
    Fallback,
}

/// One possible base URL the resolver may select
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidate {
    /// Candidate base URL, without any API path
    pub url: String,
    /// Where this candidate came from
    pub source: CandidateSource,
}

impl EndpointCandidate {
    /// Create a candidate, normalizing away a trailing slash
    pub fn new(url: impl Into<String>, source: CandidateSource) -> Self {
        let url = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            source,
        }
    }
}

/// How much trust the resolver places in a resolved endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// Selected by override or a successful probe
    High,
    /// Every probe failed; reusing the last endpoint that ever answered
    LastKnownGood,
    /// Every probe failed and nothing ever answered; blind fallback
    Low,
}

/// The currently selected endpoint, with cache metadata
#[derive(Debug, Clone)]
pub struct ResolvedEndpoint {
    /// Selected base URL
    pub base_url: String,
    /// Which candidate produced it
    pub source: CandidateSource,
    /// When discovery selected it
    pub resolved_at: DateTime<Utc>,
    /// How long the selection stays fresh
    pub ttl: Duration,
    /// Trust level of the selection
    pub confidence: Confidence,
}

impl ResolvedEndpoint {
    fn new(base_url: String, source: CandidateSource, ttl: Duration, confidence: Confidence) -> Self {
        Self {
            base_url,
            source,
            resolved_at: Utc::now(),
            ttl,
            confidence,
        }
    }

    /// Whether the TTL has elapsed since resolution
    pub fn is_stale(&self) -> bool {
        let age = Utc::now().signed_duration_since(self.resolved_at);
        age > chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero())
    }
}

/// Discovers and caches the active backend base URL
pub struct EndpointResolver {
    /// Ordered candidate list; the fallback candidate is last
    candidates: Vec<EndpointCandidate>,

    /// Probe implementation
    probe: Box<dyn LivenessProbe>,

    /// Per-candidate probe timeout
    probe_timeout: Duration,

    /// Cache TTL for a resolved endpoint
    ttl: Duration,

    /// Currently resolved endpoint, if any
    cache: RwLock<Option<ResolvedEndpoint>>,

    /// Last base URL that ever passed a probe
    last_known_good: RwLock<Option<String>>,

    /// Serializes discovery runs; racing callers queue here
    discovery: Mutex<()>,
}

impl EndpointResolver {
    /// Create a resolver over an ordered candidate list
    ///
    /// The list must end with a fallback candidate (see
    /// [`EndpointConfig::candidates`](crate::config::EndpointConfig::candidates)).
    pub fn new(
        candidates: Vec<EndpointCandidate>,
        probe: Box<dyn LivenessProbe>,
        probe_timeout: Duration,
        ttl: Duration,
    ) -> Self {
        Self {
            candidates,
            probe,
            probe_timeout,
            ttl,
            cache: RwLock::new(None),
            last_known_good: RwLock::new(None),
            discovery: Mutex::new(()),
        }
    }

    /// Current base URL, running discovery if the cache is stale or empty
    ///
    /// Never fails: with all candidates down this still answers with the
    /// last-known-good or fallback URL, at reduced confidence.
    pub async fn base_url(&self) -> String {
        if let Some(endpoint) = self.fresh_cached().await {
            return endpoint.base_url;
        }

        let _guard = self.discovery.lock().await;

        // A queued caller may find the cache already refreshed by the run
        // that held the lock before it.
        if let Some(endpoint) = self.fresh_cached().await {
            return endpoint.base_url;
        }

        let resolved = self.discover().await;
        let base_url = resolved.base_url.clone();

        if resolved.confidence == Confidence::High {
            *self.last_known_good.write().await = Some(base_url.clone());
        }
        *self.cache.write().await = Some(resolved);

        base_url
    }

    /// Force the next `base_url()` call to re-discover, even if fresh
    pub async fn invalidate(&self) {
        debug!("endpoint cache invalidated");
        *self.cache.write().await = None;
    }

    /// Invalidate and eagerly re-discover
    pub async fn refresh(&self) -> String {
        self.invalidate().await;
        self.base_url().await
    }

    /// The cached resolution, if any (stale or not), for diagnostics
    pub async fn current(&self) -> Option<ResolvedEndpoint> {
        self.cache.read().await.clone()
    }

    async fn fresh_cached(&self) -> Option<ResolvedEndpoint> {
        let cache = self.cache.read().await;
        cache.as_ref().filter(|e| !e.is_stale()).cloned()
    }

    /// One discovery run: probe candidates in order, first reachable wins
    async fn discover(&self) -> ResolvedEndpoint {
        for candidate in &self.candidates {
            if candidate.source == CandidateSource::Override {
                info!("using override endpoint {}", candidate.url);
                return ResolvedEndpoint::new(
                    candidate.url.clone(),
                    candidate.source,
                    self.ttl,
                    Confidence::High,
                );
            }

            debug!("probing candidate {} ({:?})", candidate.url, candidate.source);
            if self
                .probe
                .probe(&candidate.url, self.probe_timeout)
                .await
                .is_reachable()
            {
                info!(
                    "resolved endpoint {} ({:?})",
                    candidate.url, candidate.source
                );
                return ResolvedEndpoint::new(
                    candidate.url.clone(),
                    candidate.source,
                    self.ttl,
                    Confidence::High,
                );
            }
        }

        if let Some(url) = self.last_known_good.read().await.clone() {
            warn!(
                "all candidates unreachable, reusing last-known-good endpoint {}",
                url
            );
            return ResolvedEndpoint::new(
                url,
                CandidateSource::Fallback,
                self.ttl,
                Confidence::LastKnownGood,
            );
        }

        // The candidate list always ends with the fallback.
        let fallback = self
            .candidates
            .last()
            .map(|c| c.url.clone())
            .unwrap_or_default();
        warn!(
            "all candidates unreachable and no last-known-good endpoint, \
             falling back to {}",
            fallback
        );
        ResolvedEndpoint::new(fallback, CandidateSource::Fallback, self.ttl, Confidence::Low)
    }
}
