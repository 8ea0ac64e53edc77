//! Firebase Authentication over its public REST API.
//!
//! Mirrors the client SDK surface the auth workflows need: initialize an app
//! from its web config, get the auth instance, create accounts, sign in with
//! email and password, hand out (and refresh) id tokens, and sign out.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{IdentityProvider, ProviderError, TokenSet, User};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for account endpoints (sign up, sign in)
const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Base URL for the token exchange endpoint
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Id token lifetime assumed when the server omits or garbles `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Longest id token lifetime accepted from the server.
const MAX_TOKEN_LIFETIME_SECS: i64 = DEFAULT_TOKEN_LIFETIME_SECS * 24;

/// Web app configuration, shaped like the object handed to the JS SDK.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
}

/// Base URLs of the two REST services used for authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub identity_toolkit: String,
    pub secure_token: String,
}

impl Endpoints {
    pub fn production() -> Self {
        Self {
            identity_toolkit: IDENTITY_TOOLKIT_URL.to_string(),
            secure_token: SECURE_TOKEN_URL.to_string(),
        }
    }

    /// Route both services through a local Auth emulator (`host:port`).
    pub fn emulator(host: &str) -> Self {
        let host = host.trim_end_matches('/');
        Self {
            identity_toolkit: format!("http://{}/identitytoolkit.googleapis.com/v1", host),
            secure_token: format!("http://{}/securetoken.googleapis.com/v1", host),
        }
    }

    /// Serve both services from one base URL.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            identity_toolkit: base.to_string(),
            secure_token: base.to_string(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::production()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestErrorBody {
    error: RestError,
}

#[derive(Debug, Deserialize)]
struct RestError {
    message: String,
}

fn lifetime_secs(expires_in: Option<&str>) -> i64 {
    match expires_in.map(str::parse::<i64>) {
        Some(Ok(secs)) if (0..=MAX_TOKEN_LIFETIME_SECS).contains(&secs) => secs,
        Some(_) | None => {
            warn!(?expires_in, "Missing or invalid token lifetime, assuming default");
            DEFAULT_TOKEN_LIFETIME_SECS
        }
    }
}

/// An initialized Firebase app.
#[derive(Clone)]
pub struct FirebaseApp {
    config: FirebaseConfig,
    endpoints: Endpoints,
    client: Client,
}

impl FirebaseApp {
    pub fn initialize(config: FirebaseConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::from_code("auth/invalid-api-key"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                warn!(error = %e, "Failed to build HTTP client");
                ProviderError::from_code("auth/internal-error")
            })?;

        info!(project_id = %config.project_id, "Firebase app initialized");
        Ok(Self {
            config,
            endpoints: Endpoints::production(),
            client,
        })
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn config(&self) -> &FirebaseConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Get the auth instance for this app.
    /// The HTTP client is shared; Clone on reqwest::Client is cheap.
    pub fn auth(&self) -> FirebaseAuth {
        FirebaseAuth {
            client: self.client.clone(),
            api_key: self.config.api_key.clone(),
            endpoints: self.endpoints.clone(),
            current_user: Mutex::new(None),
        }
    }
}

/// Firebase Authentication instance holding the signed-in user.
pub struct FirebaseAuth {
    client: Client,
    api_key: String,
    endpoints: Endpoints,
    current_user: Mutex<Option<User>>,
}

impl FirebaseAuth {
    fn user_slot(&self) -> MutexGuard<'_, Option<User>> {
        self.current_user
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check if response is successful, mapping REST error bodies otherwise.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<RestErrorBody>(&body) {
            Ok(parsed) => {
                debug!(%status, message = %parsed.error.message, "Identity provider rejected request");
                Err(ProviderError::from_rest_message(&parsed.error.message))
            }
            Err(_) => {
                warn!(%status, "Unrecognized identity provider error response");
                Err(ProviderError::from_code("auth/internal-error"))
            }
        }
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
        response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse identity provider response");
            ProviderError::from_code("auth/internal-error")
        })
    }

    async fn password_request(
        &self,
        operation: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ProviderError> {
        let url = format!("{}/accounts:{}", self.endpoints.identity_toolkit, operation);
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::network(&e))?;

        let response = Self::check_response(response).await?;
        let parsed: PasswordResponse = Self::parse(response).await?;

        let user = User {
            uid: parsed.local_id,
            email: parsed.email.or_else(|| Some(email.to_string())),
            tokens: TokenSet::new(
                parsed.id_token,
                parsed.refresh_token,
                lifetime_secs(parsed.expires_in.as_deref()),
            ),
        };

        *self.user_slot() = Some(user.clone());
        Ok(user)
    }

    async fn refresh(&self, user: &User) -> Result<TokenSet, ProviderError> {
        let url = format!("{}/token", self.endpoints.secure_token);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", user.tokens.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::network(&e))?;

        let response = Self::check_response(response).await?;
        let parsed: RefreshResponse = Self::parse(response).await?;

        Ok(TokenSet::new(
            parsed.id_token,
            parsed.refresh_token,
            lifetime_secs(parsed.expires_in.as_deref()),
        ))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn create_account(&self, email: &str, password: &str) -> Result<User, ProviderError> {
        let user = self.password_request("signUp", email, password).await?;
        info!(uid = %user.uid, "Account created");
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, ProviderError> {
        let user = self
            .password_request("signInWithPassword", email, password)
            .await?;
        info!(uid = %user.uid, "Signed in");
        Ok(user)
    }

    async fn id_token(&self, user: &User) -> Result<String, ProviderError> {
        if !user.tokens.needs_refresh() {
            return Ok(user.tokens.id_token.clone());
        }

        debug!(
            uid = %user.uid,
            expired = user.tokens.is_expired(),
            "Id token near expiry, refreshing"
        );
        let tokens = self.refresh(user).await?;
        let id_token = tokens.id_token.clone();

        let mut slot = self.user_slot();
        if let Some(current) = slot.as_mut().filter(|u| u.uid == user.uid) {
            current.tokens = tokens;
        }

        Ok(id_token)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        if let Some(user) = self.user_slot().take() {
            info!(uid = %user.uid, "Signed out");
        }
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.user_slot().clone()
    }
}
