// # File Credential Store
//
// File-based implementation of CredentialStore.
//
// ## Purpose
//
// Persists the token pair across restarts on platforms without a dedicated
// secure store (desktop/dev builds). Values are opaque strings under fixed
// keys; nothing else is written.
//
// ## Durability
//
// - Atomic writes: new contents go to a temporary file, then rename
// - Corruption tolerance: an unreadable or invalid file degrades to an
//   empty store with a warning, never a construction failure — losing
//   credentials only means re-login
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "values": {
//     "access_token": "…",
//     "refresh_token": "…"
//   }
// }
// ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::warn;

use crate::ApiError;
use crate::traits::credential_store::CredentialStore;

/// Credential file format version
const CREDENTIAL_FILE_VERSION: &str = "1.0";

/// Serializable credential file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct CredentialFileFormat {
    version: String,
    values: HashMap<String, String>,
}

/// File-backed credential store with atomic writes
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FileCredentialStore {
    /// Create or load a file credential store
    ///
    /// Creates parent directories as needed. An existing file that fails to
    /// parse is treated as empty; construction only fails when the directory
    /// cannot be created.
    pub async fn new<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    ApiError::credential_store(format!(
                        "failed to create credential directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let values = Self::load(&path).await;
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    async fn load(path: &Path) -> HashMap<String, String> {
        match fs::read(path).await {
            Ok(bytes) => match serde_json::from_slice::<CredentialFileFormat>(&bytes) {
                Ok(file) => file.values,
                Err(e) => {
                    warn!(
                        "credential file {} is corrupt, starting empty: {}",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(
                    "failed to read credential file {}, starting empty: {}",
                    path.display(),
                    e
                );
                HashMap::new()
            }
        }
    }

    /// Write the current values atomically (temp file + rename)
    async fn persist(&self, values: &HashMap<String, String>) -> crate::Result<()> {
        let file = CredentialFileFormat {
            version: CREDENTIAL_FILE_VERSION.to_string(),
            values: values.clone(),
        };
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| ApiError::credential_store(format!("failed to encode credentials: {}", e)))?;

        let tmp_path = self.path.with_extension("tmp");
        let mut tmp = fs::File::create(&tmp_path).await.map_err(|e| {
            ApiError::credential_store(format!(
                "failed to create {}: {}",
                tmp_path.display(),
                e
            ))
        })?;
        tmp.write_all(&json).await.map_err(|e| {
            ApiError::credential_store(format!("failed to write {}: {}", tmp_path.display(), e))
        })?;
        tmp.sync_all().await.map_err(|e| {
            ApiError::credential_store(format!("failed to sync {}: {}", tmp_path.display(), e))
        })?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            ApiError::credential_store(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, key: &str) -> crate::Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> crate::Result<()> {
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values).await
    }

    async fn remove(&self, key: &str) -> crate::Result<()> {
        let mut values = self.values.write().await;
        if values.remove(key).is_some() {
            self.persist(&values).await?;
        }
        Ok(())
    }
}
