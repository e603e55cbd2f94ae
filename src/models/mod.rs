pub mod api_error;
pub mod credential;

// Re-export the primary model types so code outside can do
// "use crate::models::{ApiError, SessionCredential};"
pub use api_error::ApiError;
pub use credential::SessionCredential;
