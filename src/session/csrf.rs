use std::sync::{Arc, Mutex};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::ApiConfig;

/// Failure to obtain an anti-forgery token from the bootstrap endpoint.
/// Nothing else escapes this boundary; transport and decoding errors all
/// collapse into `Unavailable`.
#[derive(Error, Debug, Clone)]
pub enum CsrfError {
    #[error("anti-forgery token unavailable: {reason}")]
    Unavailable { reason: String },
}

impl CsrfError {
    fn unavailable(reason: impl Into<String>) -> Self {
        CsrfError::Unavailable {
            reason: reason.into(),
        }
    }
}

#[derive(Deserialize)]
struct CsrfTokenBody {
    token: String,
}

/// Obtains the anti-forgery token required on state-changing requests.
///
/// The token is delivered in the bootstrap response body and cached in
/// memory for the lifetime of the client; a forced re-fetch replaces it.
#[derive(Clone)]
pub struct CsrfProvider {
    http: reqwest::Client,
    endpoint: String,
    cached: Arc<Mutex<Option<String>>>,
}

impl CsrfProvider {
    pub fn new(http: reqwest::Client, api: &ApiConfig) -> Self {
        CsrfProvider {
            http,
            endpoint: api.url(&api.csrf_path),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// The token currently cached in memory, if any.
    pub fn cached(&self) -> Option<String> {
        self.cached
            .lock()
            .expect("csrf cache mutex poisoned")
            .clone()
    }

    /// Returns the cached token, fetching one from the bootstrap endpoint
    /// when none is held.
    pub async fn ensure_token(&self) -> Result<String, CsrfError> {
        if let Some(token) = self.cached() {
            return Ok(token);
        }
        self.refresh_token().await
    }

    /// Unconditionally fetches a fresh token, replacing the cached one on
    /// success. This is the anti-forgery-failure retry path.
    pub async fn refresh_token(&self) -> Result<String, CsrfError> {
        debug!("Fetching anti-forgery token from {}", self.endpoint);

        let response = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| CsrfError::unavailable(format!("bootstrap request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(CsrfError::unavailable(format!(
                "bootstrap returned status {}",
                response.status()
            )));
        }

        let body: CsrfTokenBody = response.json().await.map_err(|e| {
            CsrfError::unavailable(format!("bootstrap body was not the expected JSON: {}", e))
        })?;

        if body.token.is_empty() {
            return Err(CsrfError::unavailable("bootstrap returned an empty token"));
        }

        *self.cached.lock().expect("csrf cache mutex poisoned") = Some(body.token.clone());
        Ok(body.token)
    }
}
