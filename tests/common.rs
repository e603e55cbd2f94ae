use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use securefetch::config::ApiConfig;
use securefetch::models::SessionCredential;
use securefetch::session::{
    CsrfProvider, FetchActivity, SecureDispatcher, SessionObserver, SessionRefresher,
};
use securefetch::store::memory_store::MemoryStore;
use securefetch::store::CredentialStore;

/// Observer that counts termination signals and records whether the fetch
/// activity flag was raised when the session-expired notice fired.
pub struct RecordingObserver {
    pub expired: AtomicUsize,
    pub redirects: AtomicUsize,
    activity: FetchActivity,
    pub fetching_when_expired: Mutex<Vec<bool>>,
}

impl RecordingObserver {
    pub fn new(activity: FetchActivity) -> Self {
        RecordingObserver {
            expired: AtomicUsize::new(0),
            redirects: AtomicUsize::new(0),
            activity,
            fetching_when_expired: Mutex::new(Vec::new()),
        }
    }

    pub fn expired_count(&self) -> usize {
        self.expired.load(Ordering::SeqCst)
    }

    pub fn redirect_count(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl SessionObserver for RecordingObserver {
    fn session_expired(&self) {
        self.expired.fetch_add(1, Ordering::SeqCst);
        self.fetching_when_expired
            .lock()
            .unwrap()
            .push(self.activity.is_fetching());
    }

    fn redirect_to_sign_in(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn api_config(base_url: String) -> ApiConfig {
    ApiConfig {
        base_url,
        csrf_path: "/api/csrf-token".to_string(),
        refresh_path: "/api/refresh-token".to_string(),
        sign_in_path: "/api/sign-in".to_string(),
    }
}

pub fn credential(access_token: &str, refresh_token: Option<&str>) -> SessionCredential {
    SessionCredential::new(
        "u-1".to_string(),
        7,
        access_token.to_string(),
        refresh_token.map(str::to_string),
    )
}

/// The component graph under test, wired against a mock server.
pub struct TestSession {
    pub dispatcher: SecureDispatcher,
    pub store: Arc<dyn CredentialStore>,
    pub observer: Arc<RecordingObserver>,
    pub activity: FetchActivity,
}

pub async fn build_session(base_url: &str, seed: Option<SessionCredential>) -> TestSession {
    let api = api_config(base_url.to_string());
    let http = reqwest::Client::new();

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
    if let Some(seed) = seed {
        store.set(seed).await;
    }

    let activity = FetchActivity::new();
    let observer = Arc::new(RecordingObserver::new(activity.clone()));
    let csrf = CsrfProvider::new(http.clone(), &api);
    let refresher = SessionRefresher::new(http.clone(), &api, store.clone());
    let dispatcher = SecureDispatcher::new(
        http,
        store.clone(),
        csrf,
        refresher,
        observer.clone(),
        activity.clone(),
    );

    TestSession {
        dispatcher,
        store,
        observer,
        activity,
    }
}
