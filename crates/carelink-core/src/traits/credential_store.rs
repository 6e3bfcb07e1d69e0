// # Credential Store Trait
//
// Defines the interface for durable access/refresh token storage.
//
// ## Purpose
//
// The store persists exactly two opaque string values under fixed keys:
// the access token attached to authenticated requests and the refresh token
// used by logout/rotation flows. Nothing else is persisted by this layer.
//
// ## Implementations
//
// - In-memory: `MemoryCredentialStore` (tests, ephemeral sessions)
// - File-based: `FileCredentialStore` (JSON file, atomic writes)
// - Platform secure stores can implement this trait outside the workspace
//
// ## Failure Tolerance
//
// A broken backing store must never crash a caller; it only degrades the
// session to "unauthenticated". The tolerant accessors below encode that
// policy once so call sites don't repeat it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Fixed storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Fixed storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// The token pair persisted by this layer
///
/// Tokens are opaque to the access layer. Rotation replaces the pair
/// wholesale on login; there is no partial refresh flow here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Token attached as `Authorization: Bearer` to authenticated requests
    pub access_token: Option<String>,
    /// Token submitted by the logout flow
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// Whether an access token is present
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Trait for credential store implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
/// Mutations are serialized through the dispatcher's call path and the
/// login/logout flows; implementations still guard their own state.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read one value
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: The stored value
    /// - `Ok(None)`: No value under this key
    /// - `Err(ApiError)`: Backend failure
    async fn get(&self, key: &str) -> crate::Result<Option<String>>;

    /// Write one value, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> crate::Result<()>;

    /// Remove one value; removing an absent key is not an error
    async fn remove(&self, key: &str) -> crate::Result<()>;

    /// Access token, tolerating backend failure
    ///
    /// Backend errors are logged and mapped to `None`: the request proceeds
    /// unauthenticated instead of failing.
    async fn access_token(&self) -> Option<String> {
        match self.get(ACCESS_TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => {
                warn!("credential store read failed, proceeding unauthenticated: {}", e);
                None
            }
        }
    }

    /// Refresh token, tolerating backend failure
    async fn refresh_token(&self) -> Option<String> {
        match self.get(REFRESH_TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => {
                warn!("credential store read failed: {}", e);
                None
            }
        }
    }

    /// Persist a full token pair (login), tolerating backend failure
    ///
    /// Write errors are logged and swallowed; the session simply won't
    /// survive a restart.
    async fn store(&self, credentials: &Credentials) {
        let writes = [
            (ACCESS_TOKEN_KEY, credentials.access_token.as_deref()),
            (REFRESH_TOKEN_KEY, credentials.refresh_token.as_deref()),
        ];
        for (key, value) in writes {
            let result = match value {
                Some(value) => self.set(key, value).await,
                None => self.remove(key).await,
            };
            if let Err(e) = result {
                warn!("credential store write failed for {}: {}", key, e);
            }
        }
    }

    /// Remove both tokens (logout, or server-side 401), tolerating failure
    async fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.remove(key).await {
                warn!("credential store clear failed for {}: {}", key, e);
            }
        }
    }
}
