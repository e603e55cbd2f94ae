use tracing::{info, warn};

/// Collaborators consulted when a session is terminated: the notification
/// surface and the router's sign-in redirect. The host application injects
/// its own implementation; [`TracingObserver`] covers headless use.
pub trait SessionObserver: Send + Sync {
    /// Surface an end-user-visible session-expired notice.
    fn session_expired(&self);

    /// Navigate to the sign-in entry point.
    fn redirect_to_sign_in(&self);
}

/// Headless observer that reports session termination to the log.
#[derive(Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn session_expired(&self) {
        warn!("Session expired, sign-in required");
    }

    fn redirect_to_sign_in(&self) {
        info!("Redirecting to sign-in");
    }
}
