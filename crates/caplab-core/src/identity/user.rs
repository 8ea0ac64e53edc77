use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Buffer before expiry at which an id token is refreshed (5 minutes)
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

/// Tokens issued by the identity provider for a signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in_secs: i64,
    pub issued_at: DateTime<Utc>,
}

impl TokenSet {
    pub fn new(id_token: String, refresh_token: String, expires_in_secs: i64) -> Self {
        Self {
            id_token,
            refresh_token,
            expires_in_secs,
            issued_at: Utc::now(),
        }
    }

    /// Expiry instant, or `None` when the lifetime falls outside the
    /// representable date range.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Duration::try_seconds(self.expires_in_secs)
            .and_then(|lifetime| self.issued_at.checked_add_signed(lifetime))
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at().map_or(true, |at| Utc::now() > at)
    }

    /// Check if the id token will expire soon and should be refreshed
    pub fn needs_refresh(&self) -> bool {
        self.expires_at()
            .and_then(|at| at.checked_sub_signed(Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES)))
            .map_or(true, |refresh_at| Utc::now() > refresh_at)
    }
}

/// A user credential returned by account creation or sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Provider-assigned unique id
    pub uid: String,
    pub email: Option<String>,
    pub tokens: TokenSet,
}
