//! Contract: endpoint discovery
//!
//! Verifies the resolver's externally observable guarantees:
//! - candidates are probed in order; the first reachable one wins and no
//!   later candidate is probed
//! - an operator override wins without any probing
//! - concurrent `base_url()` calls during a discovery share one probe round
//! - when everything is down, the last-known-good endpoint is reused, else
//!   the fallback is returned at low confidence
//! - `invalidate()` forces rediscovery even when the cache is fresh

mod common;

use std::time::Duration;

use common::*;

use carelink_core::resolver::{CandidateSource, Confidence, EndpointResolver};

fn three_candidates(probe: &ScriptedProbe) -> EndpointResolver {
    resolver_with(
        vec![
            candidate("http://10.0.2.2:8000", CandidateSource::EmulatorLoopback),
            candidate("http://192.168.1.100:8000", CandidateSource::LanProbe),
            candidate("http://localhost:8000", CandidateSource::Fallback),
        ],
        probe.clone(),
    )
}

#[tokio::test]
async fn first_reachable_candidate_wins_and_probing_stops() {
    let probe = ScriptedProbe::new();
    probe.set_reachable("http://10.0.2.2:8000", false);
    probe.set_reachable("http://192.168.1.100:8000", true);
    probe.set_reachable("http://localhost:8000", true);
    let resolver = three_candidates(&probe);

    assert_eq!(resolver.base_url().await, "http://192.168.1.100:8000");
    assert_eq!(probe.probes("http://10.0.2.2:8000"), 1);
    assert_eq!(probe.probes("http://192.168.1.100:8000"), 1);
    // Probing stops at the first success.
    assert_eq!(probe.probes("http://localhost:8000"), 0);
}

#[tokio::test]
async fn override_wins_without_probing() {
    let probe = ScriptedProbe::new();
    let resolver = resolver_with(
        vec![
            candidate("http://192.168.1.50:9000", CandidateSource::Override),
            candidate("http://localhost:8000", CandidateSource::Fallback),
        ],
        probe.clone(),
    );

    assert_eq!(resolver.base_url().await, "http://192.168.1.50:9000");
    assert_eq!(probe.total_probes(), 0);
}

#[tokio::test]
async fn concurrent_callers_share_one_probe_round() {
    let probe = ScriptedProbe::new();
    probe.set_reachable("http://192.168.1.100:8000", true);
    // Widen the race window so every caller arrives mid-discovery.
    probe.set_delay(Duration::from_millis(50));
    let resolver = std::sync::Arc::new(three_candidates(&probe));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let resolver = std::sync::Arc::clone(&resolver);
        handles.push(tokio::spawn(async move { resolver.base_url().await }));
    }

    let mut urls = Vec::new();
    for handle in handles {
        urls.push(handle.await.expect("task completes"));
    }

    assert!(urls.iter().all(|u| u == "http://192.168.1.100:8000"));
    // One probe per candidate at most, across all ten callers.
    assert_eq!(probe.probes("http://10.0.2.2:8000"), 1);
    assert_eq!(probe.probes("http://192.168.1.100:8000"), 1);
}

#[tokio::test]
async fn all_down_reuses_last_known_good() {
    let probe = ScriptedProbe::new();
    probe.set_reachable("http://192.168.1.100:8000", true);
    let resolver = three_candidates(&probe);

    assert_eq!(resolver.base_url().await, "http://192.168.1.100:8000");

    // The network moved; nothing answers anymore.
    probe.set_reachable("http://192.168.1.100:8000", false);
    resolver.invalidate().await;

    assert_eq!(resolver.base_url().await, "http://192.168.1.100:8000");
    let resolved = resolver.current().await.expect("cached");
    assert_eq!(resolved.confidence, Confidence::LastKnownGood);
}

#[tokio::test]
async fn all_down_without_history_returns_low_confidence_fallback() {
    let probe = ScriptedProbe::new();
    let resolver = three_candidates(&probe);

    assert_eq!(resolver.base_url().await, "http://localhost:8000");
    let resolved = resolver.current().await.expect("cached");
    assert_eq!(resolved.confidence, Confidence::Low);
    assert_eq!(resolved.source, CandidateSource::Fallback);
}

#[tokio::test]
async fn fresh_cache_is_served_without_probing() {
    let probe = ScriptedProbe::new();
    probe.set_reachable("http://10.0.2.2:8000", true);
    let resolver = three_candidates(&probe);

    resolver.base_url().await;
    resolver.base_url().await;
    resolver.base_url().await;

    assert_eq!(probe.probes("http://10.0.2.2:8000"), 1);
}

#[tokio::test]
async fn invalidate_forces_rediscovery_even_when_fresh() {
    let probe = ScriptedProbe::new();
    probe.set_reachable("http://10.0.2.2:8000", true);
    let resolver = three_candidates(&probe);

    resolver.base_url().await;
    resolver.invalidate().await;
    resolver.base_url().await;

    assert_eq!(probe.probes("http://10.0.2.2:8000"), 2);
}

#[tokio::test]
async fn ttl_expiry_triggers_rediscovery() {
    let probe = ScriptedProbe::new();
    probe.set_reachable("http://10.0.2.2:8000", true);
    let resolver = EndpointResolver::new(
        vec![
            candidate("http://10.0.2.2:8000", CandidateSource::EmulatorLoopback),
            candidate("http://localhost:8000", CandidateSource::Fallback),
        ],
        Box::new(probe.clone()),
        Duration::from_secs(1),
        Duration::from_millis(10),
    );

    resolver.base_url().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    resolver.base_url().await;

    assert_eq!(probe.probes("http://10.0.2.2:8000"), 2);
}

#[tokio::test]
async fn refresh_is_invalidate_plus_eager_discovery() {
    let probe = ScriptedProbe::new();
    probe.set_reachable("http://10.0.2.2:8000", true);
    let resolver = three_candidates(&probe);

    resolver.base_url().await;
    probe.set_reachable("http://10.0.2.2:8000", false);
    probe.set_reachable("http://192.168.1.100:8000", true);

    assert_eq!(resolver.refresh().await, "http://192.168.1.100:8000");
}
