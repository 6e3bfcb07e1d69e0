// # Carelink HTTP
//
// This crate provides the reqwest-backed implementations of the core
// traits.
//
// ## Components
//
// - `ReqwestTransport`: executes dispatched requests (`HttpTransport`)
// - `ReqwestProber`: liveness probing for endpoint discovery
//   (`LivenessProbe`)
// - `HttpReachabilitySource`: connectivity sampling against a well-known
//   URL (`NetworkStateSource`)
// - `build_dispatcher` / `build_monitor`: wire a [`ClientConfig`] into
//   ready-to-use core components

mod network;
mod probe;
mod transport;

pub use network::HttpReachabilitySource;
pub use probe::ReqwestProber;
pub use transport::ReqwestTransport;

use std::sync::Arc;
use std::time::Duration;

use carelink_core::config::{ClientConfig, CredentialStoreConfig};
use carelink_core::resolver::EndpointResolver;
use carelink_core::traits::credential_store::CredentialStore;
use carelink_core::{ConnectivityMonitor, Dispatcher, FileCredentialStore, MemoryCredentialStore};

/// Build a dispatcher from a validated configuration
///
/// Wires the reqwest transport, the liveness prober, the endpoint resolver
/// over the configured candidates, and the configured credential store.
pub async fn build_dispatcher(config: &ClientConfig) -> carelink_core::Result<Dispatcher> {
    config.validate()?;

    let resolver = EndpointResolver::new(
        config.endpoint.candidates(),
        Box::new(ReqwestProber::new()),
        Duration::from_secs(config.endpoint.probe_timeout_secs),
        Duration::from_secs(config.endpoint.cache_ttl_secs),
    );

    let credentials: Arc<dyn CredentialStore> = match &config.credential_store {
        CredentialStoreConfig::File { path } => Arc::new(FileCredentialStore::new(path).await?),
        CredentialStoreConfig::Memory => Arc::new(MemoryCredentialStore::new()),
    };

    Ok(Dispatcher::new(
        Box::new(ReqwestTransport::new()),
        resolver,
        credentials,
        &config.request,
    ))
}

/// Build a connectivity monitor from a configuration
///
/// The monitor is returned stopped; call
/// [`start`](ConnectivityMonitor::start) to begin polling.
pub fn build_monitor(config: &ClientConfig) -> ConnectivityMonitor {
    let source = HttpReachabilitySource::new(
        config.connectivity.reachability_url.clone(),
        Duration::from_secs(config.connectivity.check_timeout_secs),
    );
    ConnectivityMonitor::new(
        Arc::new(source),
        Duration::from_secs(config.connectivity.poll_interval_secs),
    )
}
