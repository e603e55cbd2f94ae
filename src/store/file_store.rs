use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::base::CredentialStore;
use crate::models::SessionCredential;

/// Config for the file-backed credential store.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct FileStoreConfig {
    pub path: String,
}

/// Durable credential store backed by a single JSON file, the desktop
/// analog of the browser's localStorage entry.
pub struct FileStore {
    path: PathBuf,
    current: Mutex<Option<SessionCredential>>,
}

impl FileStore {
    /// Opens the store and rehydrates any persisted credential.
    /// A corrupt entry is discarded and its file removed; this never
    /// fails into application startup.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<SessionCredential>(&raw) {
                Ok(credential) => {
                    debug!("Rehydrated session credential from {}", path.display());
                    Some(credential)
                }
                Err(e) => {
                    error!("Failed to parse stored credential, discarding it: {}", e);
                    if let Err(e) = std::fs::remove_file(&path) {
                        error!("Failed to remove corrupt credential entry: {}", e);
                    }
                    None
                }
            },
            // No stored session yet.
            Err(_) => None,
        };

        FileStore {
            path,
            current: Mutex::new(current),
        }
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn set(&self, credential: SessionCredential) {
        *self
            .current
            .lock()
            .expect("credential store mutex poisoned") = Some(credential.clone());

        match serde_json::to_string(&credential) {
            Ok(raw) => {
                if let Err(e) = tokio::fs::write(&self.path, raw).await {
                    error!("Failed to persist session credential: {}", e);
                }
            }
            Err(e) => error!("Failed to encode session credential: {}", e),
        }
    }

    async fn clear(&self) {
        let was_present = self
            .current
            .lock()
            .expect("credential store mutex poisoned")
            .take()
            .is_some();
        if !was_present {
            return;
        }

        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                error!("Failed to remove persisted credential: {}", e);
            }
        }
        debug!("Session credential cleared");
    }

    fn snapshot(&self) -> Option<SessionCredential> {
        self.current
            .lock()
            .expect("credential store mutex poisoned")
            .clone()
    }
}
