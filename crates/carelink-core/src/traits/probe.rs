// # Liveness Probe Trait
//
// Defines the interface for checking whether a candidate base URL hosts a
// live backend.
//
// ## Implementations
//
// - reqwest-based (GET over well-known liveness paths): `carelink-http`
// - Scripted mocks: contract tests in this crate
//
// ## Semantics
//
// A candidate is *reachable* when an HTTP response with a status below 500
// arrives from it; a backend answering 404 or 401 on the liveness path is
// still a backend. Connection errors, timeouts, and 5xx answers mean
// *unreachable*. Probes never fail: an unreachable outcome is an answer,
// not an error.

use async_trait::async_trait;
use std::time::Duration;

/// Result of probing one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// An HTTP response with a status below 500 was received
    Reachable,
    /// Connection error, timeout, or only 5xx answers
    Unreachable,
}

impl ProbeOutcome {
    /// Whether this outcome selects the candidate
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable)
    }
}

/// Trait for liveness probe implementations
///
/// Implementations must be thread-safe; the resolver serializes discovery
/// runs, but `current`-style reads may overlap a run.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Probe a candidate base URL within the given timeout
    ///
    /// # Parameters
    ///
    /// - `base_url`: Candidate base URL, without any API path
    /// - `timeout`: Upper bound for the whole probe
    async fn probe(&self, base_url: &str, timeout: Duration) -> ProbeOutcome;
}
