use serde::{Deserialize, Serialize};

/// The credential identifying an authenticated dashboard session.
///
/// Presence of a non-empty access token is the sole authentication
/// predicate; the identity fields travel alongside it for the backend's
/// benefit. The serialized form uses camelCase names because it is also
/// the durable storage layout.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredential {
    pub user_id: String,
    pub company_id: i64,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl SessionCredential {
    /// Construct a new credential with an optional refresh token.
    pub fn new(
        user_id: impl Into<String>,
        company_id: i64,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
    ) -> Self {
        SessionCredential {
            user_id: user_id.into(),
            company_id,
            access_token: access_token.into(),
            refresh_token,
        }
    }

    /// True iff the access token is present and non-empty.
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the persisted layout round-trips with camelCase keys.
    #[test]
    fn test_persisted_layout() {
        let credential = SessionCredential::new(
            "u-17".to_string(),
            42,
            "tok-abc".to_string(),
            Some("ref-xyz".to_string()),
        );

        let raw = serde_json::to_string(&credential).unwrap();
        assert!(raw.contains("\"userId\":\"u-17\""));
        assert!(raw.contains("\"companyId\":42"));
        assert!(raw.contains("\"accessToken\":\"tok-abc\""));
        assert!(raw.contains("\"refreshToken\":\"ref-xyz\""));

        let parsed: SessionCredential = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, credential);
    }

    /// Test that a stored entry without a refresh token still parses.
    #[test]
    fn test_missing_refresh_token() {
        let raw = r#"{"userId": "u-1", "companyId": 7, "accessToken": "tok"}"#;
        let parsed: SessionCredential = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.refresh_token, None);
        assert!(parsed.has_access_token());
    }
}
