use std::fmt;

/// Name of the cookie holding the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Path attribute written with the session cookie.
const COOKIE_PATH: &str = "/";

/// Extract the session token from a `document.cookie` style string.
///
/// Pairs are `;`-delimited `key=value`. Keys are trimmed; the value of the
/// first `token` pair wins. Returns an empty string when the cookie string is
/// empty or has no `token` pair.
pub fn parse_cookie_token(cookie: &str) -> String {
    if cookie.is_empty() {
        return String::new();
    }

    for pair in cookie.split(';') {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (key, value),
            None => (pair, ""),
        };
        if key.trim() == TOKEN_COOKIE {
            return value.trim().to_string();
        }
    }

    String::new()
}

/// Authentication state of a page, inferred from the cookie at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

impl AuthState {
    pub fn from_token(token: &str) -> Self {
        if token.is_empty() {
            AuthState::Unauthenticated
        } else {
            AuthState::Authenticated
        }
    }

    pub fn from_cookie(cookie: &str) -> Self {
        Self::from_token(&parse_cookie_token(cookie))
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }
}

/// The `token` cookie assignment: `token=<value>;path=/;SameSite=Strict`.
///
/// No expiry is set, so the cookie lives for the browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    value: String,
}

impl SessionCookie {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            value: token.into(),
        }
    }

    /// The assignment that clears the session on sign-out.
    pub fn cleared() -> Self {
        Self::new(String::new())
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={};path={};SameSite=Strict",
            TOKEN_COOKIE, self.value, COOKIE_PATH
        )
    }
}
