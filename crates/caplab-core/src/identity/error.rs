use thiserror::Error;

/// Code reported when the provider could not be reached.
pub const NETWORK_REQUEST_FAILED: &str = "auth/network-request-failed";

/// A rejection from the identity provider.
///
/// `code` is a stable `auth/...` identifier; `message` is meant for users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Build an error with the provider's standard message for `code`.
    pub fn from_code(code: &str) -> Self {
        Self::new(code, format!("Firebase: Error ({}).", code))
    }

    /// Build an error whose message carries the server's detail text.
    pub fn with_detail(code: &str, detail: &str) -> Self {
        Self::new(code, format!("Firebase: {} ({}).", detail, code))
    }

    pub fn network(err: &reqwest::Error) -> Self {
        tracing::debug!(error = %err, "Identity provider unreachable");
        Self::from_code(NETWORK_REQUEST_FAILED)
    }

    /// Map a REST error message such as `WEAK_PASSWORD : Password should be
    /// at least 6 characters` to a provider error.
    pub fn from_rest_message(raw: &str) -> Self {
        let (key, detail) = match raw.split_once(" : ") {
            Some((key, detail)) => (key.trim(), Some(detail.trim())),
            None => (raw.trim(), None),
        };

        let code = match key {
            "EMAIL_EXISTS" => "auth/email-already-in-use",
            "EMAIL_NOT_FOUND" => "auth/user-not-found",
            "INVALID_PASSWORD" => "auth/wrong-password",
            "INVALID_LOGIN_CREDENTIALS" => "auth/invalid-credential",
            "INVALID_EMAIL" => "auth/invalid-email",
            "MISSING_EMAIL" => "auth/missing-email",
            "MISSING_PASSWORD" => "auth/missing-password",
            "WEAK_PASSWORD" => "auth/weak-password",
            "USER_DISABLED" => "auth/user-disabled",
            "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests",
            "OPERATION_NOT_ALLOWED" => "auth/operation-not-allowed",
            "TOKEN_EXPIRED" => "auth/user-token-expired",
            "USER_NOT_FOUND" => "auth/user-not-found",
            "INVALID_REFRESH_TOKEN" => "auth/invalid-refresh-token",
            "INVALID_GRANT_TYPE" => "auth/invalid-grant-type",
            "MISSING_REFRESH_TOKEN" => "auth/missing-refresh-token",
            "INVALID_ID_TOKEN" => "auth/invalid-user-token",
            "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => "auth/requires-recent-login",
            "API_KEY_INVALID" => "auth/invalid-api-key",
            _ if key.starts_with("API key not valid") => "auth/invalid-api-key",
            _ => "auth/internal-error",
        };

        match detail {
            Some(detail) if !detail.is_empty() => Self::with_detail(code, detail),
            _ => Self::from_code(code),
        }
    }
}
