// # carelink-core
//
// Core library for the carelink resilient API access layer.
//
// ## Architecture Overview
//
// This library provides the transport layer a mobile/web health-center
// client depends on:
// - **HttpTransport**: Trait for executing HTTP calls (implemented in `carelink-http`)
// - **LivenessProbe**: Trait for probing whether a base URL hosts a live backend
// - **CredentialStore**: Trait for durable access/refresh token storage
// - **NetworkStateSource**: Trait for sampling device connectivity
// - **EndpointResolver**: Discovers and caches the active backend base URL
// - **Dispatcher**: Issues requests with auth injection, error normalization,
//   and endpoint-swap retry on network-class failures
// - **ConnectivityMonitor**: Polls connectivity and fans state changes out to
//   subscribers
// - **ClientCell**: Guarded lazy initialization of the process-wide Dispatcher
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Orchestration lives here; concrete I/O lives
//    in implementation crates behind traits
// 2. **Single-Flight**: Endpoint discovery and client initialization each run
//    at most once concurrently; racing callers share the in-flight result
// 3. **Normalized Failures**: Every failure path is classified into `ApiError`
//    before reaching a caller; no raw transport errors escape
// 4. **Local Recovery**: Network-class failures re-resolve the endpoint and
//    retry once; everything else is surfaced immediately

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod monitor;
pub mod resolver;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use client::ClientCell;
pub use config::{ClientConfig, CredentialStoreConfig, EndpointConfig};
pub use dispatcher::{ApiResponse, Dispatcher, RequestOptions};
pub use error::{ApiError, ErrorKind, Result};
pub use monitor::{ConnectivityMonitor, Subscription};
pub use resolver::{
    CandidateSource, Confidence, EndpointCandidate, EndpointResolver, ResolvedEndpoint,
};
pub use store::{FileCredentialStore, MemoryCredentialStore};
pub use traits::{
    ConnectivityState, CredentialStore, Credentials, HttpTransport, LivenessProbe, Method,
    NetworkStateSource, TransportKind,
};
