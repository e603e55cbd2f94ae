use std::sync::Mutex;

use async_trait::async_trait;

use super::base::CredentialStore;
use crate::models::SessionCredential;

/// An in-memory credential store with no durable layer. The session is
/// gone when the process exits; used for tests and ephemeral sessions.
pub struct MemoryStore {
    current: Mutex<Option<SessionCredential>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            current: Mutex::new(None),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn set(&self, credential: SessionCredential) {
        *self
            .current
            .lock()
            .expect("credential store mutex poisoned") = Some(credential);
    }

    async fn clear(&self) {
        self.current
            .lock()
            .expect("credential store mutex poisoned")
            .take();
    }

    fn snapshot(&self) -> Option<SessionCredential> {
        self.current
            .lock()
            .expect("credential store mutex poisoned")
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that set/snapshot/clear behave as a full-value replace.
    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(!store.is_authenticated());

        let credential =
            SessionCredential::new("u-9".to_string(), 3, "tok-9".to_string(), None);
        store.set(credential.clone()).await;
        assert_eq!(store.snapshot(), Some(credential));
        assert_eq!(store.access_token().as_deref(), Some("tok-9"));

        store.clear().await;
        assert!(store.snapshot().is_none());
        assert!(!store.is_authenticated());
    }
}
