use std::collections::HashMap;

use serde::Deserialize;

/// The error payload the dashboard backend attaches to non-2xx responses.
///
/// The dispatcher hands responses back with their status untouched; callers
/// that want the structured body decode it with [`ApiError::from_response`].
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub message: String,
    pub code: String,
    pub status: u16,
    pub timestamp: String,
    pub path: String,
    /// Field name -> human readable reason, present on validation failures.
    #[serde(default)]
    pub validation_errors: Option<HashMap<String, String>>,
}

impl ApiError {
    /// Decode a backend error body, consuming the response.
    /// Returns `None` when the body is not the standard error shape.
    pub async fn from_response(response: reqwest::Response) -> Option<ApiError> {
        response.json::<ApiError>().await.ok()
    }
}
