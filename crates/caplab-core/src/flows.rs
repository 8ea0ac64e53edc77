//! Sign-up, login and sign-out workflows.
//!
//! Each workflow is a sequence of awaited steps that stops at the first
//! failure and hands it to a single terminal handler. No error leaves a
//! workflow: failures are logged, and sign-up and login failures are also
//! shown to the user through `Window::alert`.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::api::{ApiError, BackendClient, Registration};
use crate::auth::{AuthState, CookieError, CookieJar, SessionCookie};
use crate::identity::{IdentityProvider, ProviderError};
use crate::page::{BoundUi, Page};

/// Where every successful workflow sends the user.
pub const HOME_PATH: &str = "/";

/// Browser-window effects a workflow can trigger.
pub trait Window: Send + Sync {
    /// Show a blocking message to the user.
    fn alert(&self, message: &str);

    /// Navigate (reload) to `path`.
    fn navigate(&self, path: &str);
}

/// An email/password pair read from the form at click time.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Failed to register user in backend")]
    Registration(#[source] ApiError),

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error(transparent)]
    Cookie(#[from] CookieError),
}

impl AuthError {
    /// Provider error code, when the provider rejected the request.
    pub fn code(&self) -> Option<&str> {
        match self {
            AuthError::Provider(e) => Some(e.code.as_str()),
            _ => None,
        }
    }

    /// HTTP status of a failed backend call.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Registration(e) => e.status(),
            AuthError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NetworkError(e) => AuthError::Network(e),
            other => AuthError::Registration(other),
        }
    }
}

/// Everything the workflows share: the identity provider, the backend client
/// and the cookie jar. Built once by the host at startup.
#[derive(Clone)]
pub struct AuthContext {
    provider: Arc<dyn IdentityProvider>,
    backend: BackendClient,
    cookies: Arc<dyn CookieJar>,
}

impl AuthContext {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        backend: BackendClient,
        cookies: Arc<dyn CookieJar>,
    ) -> Self {
        Self {
            provider,
            backend,
            cookies,
        }
    }

    pub fn provider(&self) -> &dyn IdentityProvider {
        self.provider.as_ref()
    }

    pub fn cookies(&self) -> &dyn CookieJar {
        self.cookies.as_ref()
    }

    /// Page-load handler: sync control visibility from the current cookie.
    pub fn load<P: Page + ?Sized>(&self, ui: &BoundUi, page: &mut P) -> AuthState {
        ui.update_ui(page, &self.cookies.cookie_string())
    }

    fn store_token(&self, token: &str) -> Result<(), CookieError> {
        self.cookies.write(&SessionCookie::new(token).to_string())
    }

    /// Create an account, store its token, register it with the backend,
    /// then go home. A backend failure leaves the account and cookie in place.
    pub async fn sign_up(&self, credentials: Credentials, window: &dyn Window) {
        match self.run_sign_up(&credentials).await {
            Ok(()) => {
                info!("Redirecting home after sign-up");
                window.navigate(HOME_PATH);
            }
            Err(e) => {
                error!(code = ?e.code(), status = ?e.status(), message = %e, "Sign-up error");
                window.alert(&format!("Sign-up failed: {}", e));
            }
        }
    }

    async fn run_sign_up(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let user = self
            .provider
            .create_account(credentials.email(), credentials.password())
            .await?;
        info!(uid = %user.uid, "User created, getting token");

        let token = self.provider.id_token(&user).await?;
        self.store_token(&token)?;

        info!("Sending user to backend");
        let registration = Registration {
            uid: user.uid.clone(),
            email: user.email.clone(),
        };
        self.backend.register_user(&token, &registration).await?;
        Ok(())
    }

    /// Sign in, store the token, then go home.
    pub async fn login(&self, credentials: Credentials, window: &dyn Window) {
        match self.run_login(&credentials).await {
            Ok(()) => window.navigate(HOME_PATH),
            Err(e) => {
                error!(code = ?e.code(), message = %e, "Login error");
                window.alert(&format!("Login failed: {}", e));
            }
        }
    }

    async fn run_login(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let user = self
            .provider
            .sign_in(credentials.email(), credentials.password())
            .await?;
        let token = self.provider.id_token(&user).await?;
        self.store_token(&token)?;
        info!(uid = %user.uid, "Login successful");
        Ok(())
    }

    /// Sign out and clear the token. Failures are logged only; the user
    /// is not alerted.
    pub async fn sign_out(&self, window: &dyn Window) {
        match self.run_sign_out().await {
            Ok(()) => window.navigate(HOME_PATH),
            Err(e) => {
                error!(code = ?e.code(), message = %e, "Sign-out error");
            }
        }
    }

    async fn run_sign_out(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await?;
        self.cookies.write(&SessionCookie::cleared().to_string())?;
        Ok(())
    }
}
