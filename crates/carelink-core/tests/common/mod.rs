//! Shared scripted mocks for the contract tests
//!
//! Mocks are handles over `Arc` inners so a test can keep inspecting (and
//! re-scripting) them after handing a boxed clone to the component under
//! test.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use carelink_core::config::RequestConfig;
use carelink_core::resolver::{CandidateSource, EndpointCandidate, EndpointResolver};
use carelink_core::traits::{
    ConnectivityState, HttpTransport, LivenessProbe, NetworkStateSource, ProbeOutcome,
    TransportError, TransportRequest, TransportResponse,
};
use carelink_core::{Dispatcher, MemoryCredentialStore};

/// Probe whose per-URL reachability can be flipped mid-test, counting calls
#[derive(Clone, Default)]
pub struct ScriptedProbe {
    inner: Arc<ProbeInner>,
}

#[derive(Default)]
struct ProbeInner {
    reachable: Mutex<HashMap<String, bool>>,
    counts: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a URL reachable or not; unknown URLs are unreachable
    pub fn set_reachable(&self, url: &str, reachable: bool) {
        self.inner
            .reachable
            .lock()
            .unwrap()
            .insert(url.to_string(), reachable);
    }

    /// Delay every probe answer (to widen concurrency windows)
    pub fn set_delay(&self, delay: Duration) {
        *self.inner.delay.lock().unwrap() = Some(delay);
    }

    /// How many times a URL was probed
    pub fn probes(&self, url: &str) -> usize {
        self.inner
            .counts
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    /// Total probes across all URLs
    pub fn total_probes(&self) -> usize {
        self.inner.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LivenessProbe for ScriptedProbe {
    async fn probe(&self, base_url: &str, _timeout: Duration) -> ProbeOutcome {
        let delay = *self.inner.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.total.fetch_add(1, Ordering::SeqCst);
        *self
            .inner
            .counts
            .lock()
            .unwrap()
            .entry(base_url.to_string())
            .or_insert(0) += 1;
        let reachable = self
            .inner
            .reachable
            .lock()
            .unwrap()
            .get(base_url)
            .copied()
            .unwrap_or(false);
        if reachable {
            ProbeOutcome::Reachable
        } else {
            ProbeOutcome::Unreachable
        }
    }
}

/// Transport that replays a scripted outcome per call and records requests
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    inner: Arc<TransportInner>,
}

#[derive(Default)]
struct TransportInner {
    script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    executed: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, status: u16, body: &[u8]) {
        self.inner.script.lock().unwrap().push_back(Ok(TransportResponse {
            status,
            body: body.to_vec(),
        }));
    }

    pub fn push_error(&self, error: TransportError) {
        self.inner.script.lock().unwrap().push_back(Err(error));
    }

    /// Requests seen so far, in execution order
    pub fn executed(&self) -> Vec<TransportRequest> {
        self.inner.executed.lock().unwrap().clone()
    }

    pub fn executed_count(&self) -> usize {
        self.inner.executed.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.inner.executed.lock().unwrap().push(request);
        self.inner
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(TransportResponse {
                status: 200,
                body: b"{}".to_vec(),
            }))
    }
}

/// Connectivity source replaying a scripted sequence, repeating the last
/// state once exhausted
#[derive(Clone)]
pub struct ScriptedSource {
    inner: Arc<SourceInner>,
}

struct SourceInner {
    script: Mutex<VecDeque<ConnectivityState>>,
    last: Mutex<ConnectivityState>,
    checks: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(states: Vec<ConnectivityState>) -> Self {
        Self {
            inner: Arc::new(SourceInner {
                script: Mutex::new(states.into()),
                last: Mutex::new(ConnectivityState::offline()),
                checks: AtomicUsize::new(0),
            }),
        }
    }

    pub fn push(&self, state: ConnectivityState) {
        self.inner.script.lock().unwrap().push_back(state);
    }

    /// How many times the source has been sampled
    pub fn checks(&self) -> usize {
        self.inner.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkStateSource for ScriptedSource {
    async fn check(&self) -> carelink_core::Result<ConnectivityState> {
        self.inner.checks.fetch_add(1, Ordering::SeqCst);
        let next = self.inner.script.lock().unwrap().pop_front();
        match next {
            Some(state) => {
                *self.inner.last.lock().unwrap() = state.clone();
                Ok(state)
            }
            None => Ok(self.inner.last.lock().unwrap().clone()),
        }
    }
}

/// Source whose checks always fail
pub struct FailingSource;

#[async_trait]
impl NetworkStateSource for FailingSource {
    async fn check(&self) -> carelink_core::Result<ConnectivityState> {
        Err(carelink_core::ApiError::other("no network API available"))
    }
}

pub fn candidate(url: &str, source: CandidateSource) -> EndpointCandidate {
    EndpointCandidate::new(url, source)
}

/// Resolver over the given candidates with a long TTL
pub fn resolver_with(candidates: Vec<EndpointCandidate>, probe: ScriptedProbe) -> EndpointResolver {
    EndpointResolver::new(
        candidates,
        Box::new(probe),
        Duration::from_secs(1),
        Duration::from_secs(300),
    )
}

/// Request config without retry backoff, to keep tests fast
pub fn fast_request_config() -> RequestConfig {
    RequestConfig {
        timeout_secs: 5,
        retry_delay_ms: 0,
    }
}

/// A minimal working dispatcher for lifecycle tests
pub fn make_dispatcher() -> Dispatcher {
    let probe = ScriptedProbe::new();
    probe.set_reachable("http://localhost:8000", true);
    let resolver = resolver_with(
        vec![candidate("http://localhost:8000", CandidateSource::Fallback)],
        probe,
    );
    Dispatcher::new(
        Box::new(ScriptedTransport::new()),
        resolver,
        Arc::new(MemoryCredentialStore::new()),
        &fast_request_config(),
    )
}
