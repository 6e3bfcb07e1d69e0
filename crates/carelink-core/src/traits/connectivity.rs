// # Network State Source Trait
//
// Defines the interface for sampling device connectivity.
//
// ## Implementations
//
// - HTTP reachability check: `carelink-http` crate
// - Platform APIs (OS network-change events) can implement this trait
//   outside the workspace
// - Scripted mocks: contract tests in this crate
//
// ## Semantics
//
// Sources are sampled by the `ConnectivityMonitor`; they report a point-in-
// time state and make no decisions. A source that cannot complete its check
// reports the offline state rather than failing.

use async_trait::async_trait;

/// Kind of network transport carrying the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Wifi,
    Cellular,
    /// No transport at all
    None,
    /// Connected through a transport the source cannot identify
    Unknown,
}

/// Point-in-time device connectivity
///
/// Compared for equality before every broadcast so that repeated identical
/// samples produce no subscriber notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityState {
    /// Whether any network transport is up
    pub is_connected: bool,
    /// Whether the wider internet answered, if the source can tell
    pub is_internet_reachable: Option<bool>,
    /// Transport kind carrying the connection
    pub transport: TransportKind,
}

impl ConnectivityState {
    /// State reported when a check fails or no transport is up
    pub fn offline() -> Self {
        Self {
            is_connected: false,
            is_internet_reachable: Some(false),
            transport: TransportKind::None,
        }
    }

    /// Connected state over the given transport
    pub fn online(transport: TransportKind) -> Self {
        Self {
            is_connected: true,
            is_internet_reachable: Some(true),
            transport,
        }
    }
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self::offline()
    }
}

/// Trait for connectivity source implementations
#[async_trait]
pub trait NetworkStateSource: Send + Sync {
    /// Sample current connectivity
    ///
    /// Implementations should map their own failures to
    /// [`ConnectivityState::offline`] and log them; the monitor treats an
    /// `Err` the same way.
    async fn check(&self) -> crate::Result<ConnectivityState>;
}
