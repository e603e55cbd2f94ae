//! Session facade wiring configuration into the component graph.
//!
//! One `SecureClient` per signed-in user: it owns the credential store,
//! the token plumbing, and the dispatcher, and carries the sign-in /
//! sign-out operations that create and destroy the session credential.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::ConfigV1;
use crate::models::SessionCredential;
use crate::session::{
    CsrfProvider, FetchActivity, RequestOptions, SecureDispatcher, SessionObserver,
    SessionRefresher, TracingObserver,
};
use crate::store::{create_store, CredentialStore};

/// Failure of the sign-in exchange. The store is never touched on failure.
#[derive(Error, Debug)]
pub enum SignInError {
    #[error("sign-in request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("sign-in rejected with status {status}")]
    Rejected { status: u16 },

    #[error("sign-in returned a malformed payload: {reason}")]
    MalformedPayload { reason: String },
}

/// The authenticated API client: credential store, token providers, and
/// the secure request dispatcher, built from one config.
pub struct SecureClient {
    http: reqwest::Client,
    store: Arc<dyn CredentialStore>,
    dispatcher: SecureDispatcher,
    activity: FetchActivity,
    sign_in_url: String,
}

impl SecureClient {
    /// Build the client with the headless tracing observer.
    pub fn from_config(config: &ConfigV1) -> Self {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    /// Build the client with the host application's observer (router and
    /// notification surface).
    pub fn with_observer(config: &ConfigV1, observer: Arc<dyn SessionObserver>) -> Self {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Could not construct HTTP client");

        let store = create_store(&config.store);
        let activity = FetchActivity::new();
        let csrf = CsrfProvider::new(http.clone(), &config.api);
        let refresher = SessionRefresher::new(http.clone(), &config.api, store.clone());
        let dispatcher = SecureDispatcher::new(
            http.clone(),
            store.clone(),
            csrf,
            refresher,
            observer,
            activity.clone(),
        );

        SecureClient {
            http,
            store,
            dispatcher,
            activity,
            sign_in_url: config.api.url(&config.api.sign_in_path),
        }
    }

    /// Exchange username/password for a session credential and store it.
    pub async fn sign_in(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionCredential, SignInError> {
        let response = self
            .http
            .post(&self.sign_in_url)
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SignInError::Rejected {
                status: response.status().as_u16(),
            });
        }

        let credential: SessionCredential =
            response.json().await.map_err(|e| SignInError::MalformedPayload {
                reason: e.to_string(),
            })?;
        if !credential.has_access_token() {
            return Err(SignInError::MalformedPayload {
                reason: "empty accessToken".to_string(),
            });
        }

        self.store.set(credential.clone()).await;
        info!("Signed in as '{}'", credential.user_id);
        Ok(credential)
    }

    /// Explicit sign-out: destroys the credential. No notice, no redirect;
    /// the host application is driving.
    pub async fn sign_out(&self) {
        self.store.clear().await;
        info!("Signed out");
    }

    /// Dispatch a request through the secure request pipeline.
    pub async fn secure_request(
        &self,
        target: &str,
        options: RequestOptions,
    ) -> Result<Option<reqwest::Response>, crate::session::DispatchError> {
        self.dispatcher.secure_request(target, options).await
    }

    pub fn dispatcher(&self) -> &SecureDispatcher {
        &self.dispatcher
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn activity(&self) -> &FetchActivity {
        &self.activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, LoggingConfig, StoreConfig};
    use mockito::Server;

    fn test_config(base_url: String) -> ConfigV1 {
        ConfigV1 {
            api: ApiConfig {
                base_url,
                csrf_path: "/api/csrf-token".to_string(),
                refresh_path: "/api/refresh-token".to_string(),
                sign_in_path: "/api/sign-in".to_string(),
            },
            store: StoreConfig {
                enabled: false,
                backend: None,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "console".to_string(),
            },
        }
    }

    /// Test that a successful sign-in stores the returned credential.
    #[tokio::test]
    async fn test_sign_in_success_populates_store() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/sign-in")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"userId": "u-1", "companyId": 7, "accessToken": "tok", "refreshToken": "ref"}"#,
            )
            .create_async()
            .await;

        let client = SecureClient::from_config(&test_config(server.url()));
        let credential = client.sign_in("adam", "admin").await.unwrap();
        m.assert_async().await;

        assert_eq!(credential.user_id, "u-1");
        assert!(client.store().is_authenticated());
        assert_eq!(client.store().access_token().as_deref(), Some("tok"));
    }

    /// Test that a rejected sign-in leaves the store untouched.
    #[tokio::test]
    async fn test_sign_in_rejection_leaves_store_empty() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/sign-in")
            .with_status(401)
            .create_async()
            .await;

        let client = SecureClient::from_config(&test_config(server.url()));
        let result = client.sign_in("adam", "wrong").await;

        assert!(matches!(result, Err(SignInError::Rejected { status: 401 })));
        assert!(!client.store().is_authenticated());
    }

    /// Test that sign-out clears the stored credential.
    #[tokio::test]
    async fn test_sign_out_clears_store() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/sign-in")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"userId": "u-1", "companyId": 7, "accessToken": "tok"}"#)
            .create_async()
            .await;

        let client = SecureClient::from_config(&test_config(server.url()));
        client.sign_in("adam", "admin").await.unwrap();
        assert!(client.store().is_authenticated());

        client.sign_out().await;
        assert!(!client.store().is_authenticated());
    }
}
