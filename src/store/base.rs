use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use super::file_store::FileStore;
use super::memory_store::MemoryStore;
use crate::config::{StoreBackend, StoreConfig};
use crate::models::SessionCredential;

/// The CredentialStore trait abstracts session credential storage.
///
/// Every mutation is a full-value replace: readers observe either the old
/// snapshot or the new one, never a partially updated credential.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Overwrite the in-memory snapshot and the durable entry. Both are
    /// updated before this returns.
    async fn set(&self, credential: SessionCredential);

    /// Reset the snapshot to absent and remove the durable entry.
    /// A no-op when no credential is held.
    async fn clear(&self);

    /// Full-value copy of the current credential, if any.
    fn snapshot(&self) -> Option<SessionCredential>;

    /// The current access token, when present and non-empty.
    fn access_token(&self) -> Option<String> {
        self.snapshot()
            .map(|credential| credential.access_token)
            .filter(|token| !token.is_empty())
    }

    /// True iff an access token is present and non-empty.
    fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }
}

/// Creates a concrete store implementation based on the StoreConfig.
/// If `store.enabled = false`, credentials live in memory only.
pub fn create_store(config: &StoreConfig) -> Arc<dyn CredentialStore> {
    if !config.enabled {
        info!("Credential persistence is disabled. Using MemoryStore.");
        return Arc::new(MemoryStore::new());
    }

    match &config.backend {
        Some(StoreBackend::File(file_config)) => Arc::new(FileStore::open(&file_config.path)),
        None => {
            error!("Store is enabled, but no backend config is provided!");
            std::process::exit(1);
        }
    }
}
