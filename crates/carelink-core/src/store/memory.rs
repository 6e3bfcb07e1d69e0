// # Memory Credential Store
//
// In-memory implementation of CredentialStore.
//
// ## Purpose
//
// Tokens live only as long as the process: suitable for tests and for
// ephemeral sessions where persisting credentials is undesirable. After a
// restart the user is simply unauthenticated again.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::traits::credential_store::CredentialStore;

/// In-memory credential store (not persistent)
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: &str) -> crate::Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> crate::Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> crate::Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::credential_store::{ACCESS_TOKEN_KEY, Credentials};

    #[tokio::test]
    async fn set_get_remove_roundtrip() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);

        store.set(ACCESS_TOKEN_KEY, "abc").await.unwrap();
        assert_eq!(
            store.get(ACCESS_TOKEN_KEY).await.unwrap(),
            Some("abc".to_string())
        );

        store.remove(ACCESS_TOKEN_KEY).await.unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn removing_absent_key_is_not_an_error() {
        let store = MemoryCredentialStore::new();
        store.remove("missing").await.unwrap();
    }

    #[tokio::test]
    async fn store_and_clear_manage_both_tokens() {
        let store = MemoryCredentialStore::new();
        store
            .store(&Credentials {
                access_token: Some("access".to_string()),
                refresh_token: Some("refresh".to_string()),
            })
            .await;

        assert_eq!(store.access_token().await, Some("access".to_string()));
        assert_eq!(store.refresh_token().await, Some("refresh".to_string()));

        store.clear().await;
        assert_eq!(store.access_token().await, None);
        assert_eq!(store.refresh_token().await, None);
    }
}
