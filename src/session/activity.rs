use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Busy/idle signal observed by UI loading indicators.
///
/// The flag is raised for the duration of one outer dispatch, internal
/// retries included, and lowered again on every exit path.
#[derive(Clone, Default)]
pub struct FetchActivity {
    fetching: Arc<AtomicBool>,
}

impl FetchActivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a dispatch is currently in flight.
    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::SeqCst)
    }

    /// Raises the flag until the returned guard is dropped.
    pub(crate) fn start(&self) -> ActivityGuard {
        self.fetching.store(true, Ordering::SeqCst);
        ActivityGuard {
            fetching: self.fetching.clone(),
        }
    }
}

/// Lowers the flag on drop, whatever the exit path.
pub(crate) struct ActivityGuard {
    fetching: Arc<AtomicBool>,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.fetching.store(false, Ordering::SeqCst);
    }
}
