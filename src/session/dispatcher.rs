use std::sync::Arc;

use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use http::Method;
use reqwest::StatusCode;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use super::activity::FetchActivity;
use super::csrf::CsrfProvider;
use super::observer::SessionObserver;
use super::refresher::SessionRefresher;
use crate::store::CredentialStore;

/// Header carrying the anti-forgery token on state-changing requests.
pub const XSRF_HEADER: HeaderName = HeaderName::from_static("x-xsrf-token");

/// Methods with create/update/replace/delete semantics; only these need
/// an anti-forgery token.
fn is_state_changing(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(method)
}

/// Terminal failures a dispatch can surface to its caller. Everything
/// recoverable is handled inside; an unrecoverable session failure is the
/// `Ok(None)` sentinel, not an error.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Transport-level failure on the first dispatch. The caller decides
    /// what to do with it; the session stays intact.
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// The caller's cancellation signal fired. Non-retryable, and the
    /// session stays intact.
    #[error("request cancelled")]
    Cancelled,
}

/// Per-call request intent. Constructed fresh for every dispatch, never
/// reused across calls.
#[derive(Default, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub json: Option<serde_json::Value>,
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn get() -> Self {
        RequestOptions::default()
    }

    pub fn post(json: serde_json::Value) -> Self {
        RequestOptions {
            method: Method::POST,
            json: Some(json),
            ..Default::default()
        }
    }

    pub fn put(json: serde_json::Value) -> Self {
        RequestOptions {
            method: Method::PUT,
            json: Some(json),
            ..Default::default()
        }
    }

    pub fn delete() -> Self {
        RequestOptions {
            method: Method::DELETE,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Wraps outbound calls with credential attachment, failure triage, and
/// at most one recovery retry per call.
pub struct SecureDispatcher {
    http: reqwest::Client,
    store: Arc<dyn CredentialStore>,
    csrf: CsrfProvider,
    refresher: SessionRefresher,
    observer: Arc<dyn SessionObserver>,
    activity: FetchActivity,
}

impl SecureDispatcher {
    pub fn new(
        http: reqwest::Client,
        store: Arc<dyn CredentialStore>,
        csrf: CsrfProvider,
        refresher: SessionRefresher,
        observer: Arc<dyn SessionObserver>,
        activity: FetchActivity,
    ) -> Self {
        SecureDispatcher {
            http,
            store,
            csrf,
            refresher,
            observer,
            activity,
        }
    }

    /// Dispatches `options` against `target`, attaching credentials and
    /// recovering at most once from an authentication or anti-forgery
    /// failure.
    ///
    /// Resolves to `Ok(Some(response))` with whatever status the server
    /// chose, or `Ok(None)` when the session was terminated and the
    /// caller should abandon its workflow.
    pub async fn secure_request(
        &self,
        target: &str,
        options: RequestOptions,
    ) -> Result<Option<reqwest::Response>, DispatchError> {
        let _activity = self.activity.start();
        let call_id = Uuid::new_v4();
        let cancel = options.cancel.clone().unwrap_or_default();
        let needs_csrf = is_state_changing(&options.method);

        let mut headers = options.headers.clone();

        if needs_csrf {
            let token = match self.csrf.ensure_token().await {
                Ok(token) => token,
                Err(e) => {
                    warn!(%call_id, "Could not obtain anti-forgery token: {}", e);
                    self.terminate_session().await;
                    return Ok(None);
                }
            };
            insert_header(&mut headers, XSRF_HEADER, &token);
        }

        if let Some(token) = self.store.access_token() {
            insert_header(&mut headers, AUTHORIZATION, &format!("Bearer {}", token));
        }

        debug!(%call_id, method = %options.method, url = target, "Dispatching request");
        let response = self
            .dispatch(target, &options, headers.clone(), &cancel)
            .await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            debug!(%call_id, "Authentication failure, attempting refresh exchange");
            return match self.refresher.refresh().await {
                Ok(new_token) => {
                    insert_header(&mut headers, AUTHORIZATION, &format!("Bearer {}", new_token));
                    let retried = self.reissue(target, &options, headers, &cancel, call_id).await?;
                    match retried {
                        Some(r) if r.status() == StatusCode::UNAUTHORIZED => {
                            warn!(%call_id, "Retried request still unauthorized, terminating session");
                            self.terminate_session().await;
                            Ok(None)
                        }
                        other => Ok(other),
                    }
                }
                Err(e) => {
                    // The refresher already cleared the store.
                    warn!(%call_id, "Refresh exchange failed: {}", e);
                    self.terminate_session().await;
                    Ok(None)
                }
            };
        }

        if status == StatusCode::FORBIDDEN && needs_csrf {
            debug!(%call_id, "Anti-forgery failure, refetching token");
            return match self.csrf.refresh_token().await {
                Ok(token) => {
                    insert_header(&mut headers, XSRF_HEADER, &token);
                    // A second anti-forgery failure is returned as received.
                    self.reissue(target, &options, headers, &cancel, call_id).await
                }
                Err(e) => {
                    warn!(%call_id, "Could not refetch anti-forgery token: {}", e);
                    self.terminate_session().await;
                    Ok(None)
                }
            };
        }

        Ok(Some(response))
    }

    /// Issues one network call, racing the caller's cancellation signal.
    async fn dispatch(
        &self,
        target: &str,
        options: &RequestOptions,
        headers: HeaderMap,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, DispatchError> {
        let mut request = self
            .http
            .request(options.method.clone(), target)
            .headers(headers);
        if let Some(json) = &options.json {
            request = request.json(json);
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(DispatchError::Cancelled),
            result = request.send() => Ok(result?),
        }
    }

    /// Reissues the identical request once. A transport failure here
    /// collapses to the terminate path instead of surfacing to the caller.
    async fn reissue(
        &self,
        target: &str,
        options: &RequestOptions,
        headers: HeaderMap,
        cancel: &CancellationToken,
        call_id: Uuid,
    ) -> Result<Option<reqwest::Response>, DispatchError> {
        debug!(%call_id, "Reissuing request after recovery");
        match self.dispatch(target, options, headers, cancel).await {
            Ok(response) => Ok(Some(response)),
            Err(DispatchError::Cancelled) => Err(DispatchError::Cancelled),
            Err(DispatchError::Network(e)) => {
                warn!(%call_id, "Retried request failed on the wire: {}", e);
                self.terminate_session().await;
                Ok(None)
            }
        }
    }

    /// The single session-termination path: clear credentials, tell the
    /// user, hand control to the sign-in route. Reached at most once per
    /// call chain, and safe to reach after the refresher has already
    /// cleared the store.
    async fn terminate_session(&self) {
        self.store.clear().await;
        self.observer.session_expired();
        self.observer.redirect_to_sign_in();
    }
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => warn!("Dropping header '{}' with a non-printable value", name.as_str()),
    }
}
