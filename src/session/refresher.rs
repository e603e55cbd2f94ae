use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::models::SessionCredential;
use crate::store::CredentialStore;

/// Failure of the refresh exchange. By the time one of these surfaces,
/// the credential store has already been cleared; callers must not clear
/// it again themselves.
#[derive(Error, Debug, Clone)]
pub enum RefreshError {
    #[error("refresh exchange failed: {reason}")]
    Exchange { reason: String },

    #[error("refresh exchange returned a malformed payload: {reason}")]
    MalformedPayload { reason: String },
}

/// What the refresh endpoint returns on success. Identity fields are
/// optional; servers that rotate only the tokens omit them.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    access_token: String,
    refresh_token: Option<String>,
    user_id: Option<String>,
    company_id: Option<i64>,
}

type InflightRefresh = Shared<BoxFuture<'static, Result<String, RefreshError>>>;

/// Exchanges an expiring session for a new access token.
///
/// Owns session invalidation: every failed exchange clears the credential
/// store before returning. Concurrent callers share a single in-flight
/// exchange instead of issuing duplicates.
#[derive(Clone)]
pub struct SessionRefresher {
    inner: Arc<RefresherInner>,
}

struct RefresherInner {
    http: reqwest::Client,
    endpoint: String,
    store: Arc<dyn CredentialStore>,
    inflight: Mutex<Option<InflightRefresh>>,
}

impl SessionRefresher {
    pub fn new(http: reqwest::Client, api: &ApiConfig, store: Arc<dyn CredentialStore>) -> Self {
        SessionRefresher {
            inner: Arc::new(RefresherInner {
                http,
                endpoint: api.url(&api.refresh_path),
                store,
                inflight: Mutex::new(None),
            }),
        }
    }

    /// Runs the refresh exchange, or joins the one already in flight and
    /// receives its result.
    pub async fn refresh(&self) -> Result<String, RefreshError> {
        let fut = {
            let mut slot = self
                .inner
                .inflight
                .lock()
                .expect("refresh guard mutex poisoned");
            match slot.as_ref() {
                Some(inflight) => {
                    debug!("Joining in-flight refresh exchange");
                    inflight.clone()
                }
                None => {
                    let inner = self.inner.clone();
                    let fut = async move { inner.exchange().await }.boxed().shared();
                    *slot = Some(fut.clone());
                    fut
                }
            }
        };

        let result = fut.clone().await;

        // Retire the slot so the next expiry starts a fresh exchange.
        let mut slot = self
            .inner
            .inflight
            .lock()
            .expect("refresh guard mutex poisoned");
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&fut)) {
            *slot = None;
        }

        result
    }
}

impl RefresherInner {
    async fn exchange(self: Arc<Self>) -> Result<String, RefreshError> {
        let result = self.run_exchange().await;
        if let Err(ref e) = result {
            warn!("Refresh exchange failed, invalidating session: {}", e);
            self.store.clear().await;
        }
        result
    }

    async fn run_exchange(&self) -> Result<String, RefreshError> {
        debug!("Refreshing session at {}", self.endpoint);

        // The refresh token travels in the body when we hold one; the
        // transport may also carry the credential in an http-only cookie.
        let mut body = serde_json::Map::new();
        if let Some(token) = self
            .store
            .snapshot()
            .and_then(|credential| credential.refresh_token)
        {
            body.insert("refreshToken".to_string(), token.into());
        }

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| RefreshError::Exchange {
                reason: format!("request failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(RefreshError::Exchange {
                reason: format!("status {}", response.status()),
            });
        }

        let payload: RefreshBody =
            response.json().await.map_err(|e| RefreshError::MalformedPayload {
                reason: e.to_string(),
            })?;

        if payload.access_token.is_empty() {
            return Err(RefreshError::MalformedPayload {
                reason: "empty accessToken".to_string(),
            });
        }

        // Full-value replace: identity fields carry forward unless the
        // server returned fresh ones.
        let previous = self.store.snapshot();
        let credential = SessionCredential {
            user_id: payload
                .user_id
                .or_else(|| previous.as_ref().map(|c| c.user_id.clone()))
                .unwrap_or_default(),
            company_id: payload
                .company_id
                .or_else(|| previous.as_ref().map(|c| c.company_id))
                .unwrap_or_default(),
            access_token: payload.access_token.clone(),
            refresh_token: payload
                .refresh_token
                .or_else(|| previous.and_then(|c| c.refresh_token)),
        };
        self.store.set(credential).await;

        info!("Session refreshed");
        Ok(payload.access_token)
    }
}
