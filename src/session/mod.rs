pub mod activity;
pub mod csrf;
pub mod dispatcher;
pub mod observer;
pub mod refresher;

// Re-export the pieces callers wire together so code outside can do
// "use crate::session::{SecureDispatcher, RequestOptions};"
pub use activity::FetchActivity;
pub use csrf::{CsrfError, CsrfProvider};
pub use dispatcher::{DispatchError, RequestOptions, SecureDispatcher, XSRF_HEADER};
pub use observer::{SessionObserver, TracingObserver};
pub use refresher::{RefreshError, SessionRefresher};
