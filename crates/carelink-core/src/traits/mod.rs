//! Trait seams between the core orchestration and concrete I/O
//!
//! The core crate owns control flow (discovery, retry, lifecycle, broadcast)
//! and delegates every side effect to one of these traits. Implementations
//! live in separate crates (see `carelink-http`) or in tests.

pub mod connectivity;
pub mod credential_store;
pub mod probe;
pub mod transport;

pub use connectivity::{ConnectivityState, NetworkStateSource, TransportKind};
pub use credential_store::{
    ACCESS_TOKEN_KEY, CredentialStore, Credentials, REFRESH_TOKEN_KEY,
};
pub use probe::{LivenessProbe, ProbeOutcome};
pub use transport::{HttpTransport, Method, TransportError, TransportRequest, TransportResponse};
