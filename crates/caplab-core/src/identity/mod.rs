//! Identity provider seam.
//!
//! Credential verification is delegated to an external identity provider.
//! This module provides:
//! - `IdentityProvider`: the operations the auth workflows consume
//! - `User` / `TokenSet`: the signed-in credential and its id token
//! - `ProviderError`: rejections carrying a provider `code` and `message`
//! - `firebase`: the Firebase Authentication REST implementation

pub mod error;
pub mod firebase;
pub mod user;

use async_trait::async_trait;

pub use error::ProviderError;
pub use firebase::{Endpoints, FirebaseApp, FirebaseAuth, FirebaseConfig};
pub use user::{TokenSet, User};

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and sign it in.
    async fn create_account(&self, email: &str, password: &str) -> Result<User, ProviderError>;

    /// Sign in an existing account.
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, ProviderError>;

    /// Return a valid identity token for `user`, refreshing it if needed.
    async fn id_token(&self, user: &User) -> Result<String, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    fn current_user(&self) -> Option<User>;
}
