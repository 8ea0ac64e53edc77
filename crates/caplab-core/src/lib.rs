//! Core library for caplab.
//!
//! Provides the pieces a host (terminal UI, web view, test harness) needs to
//! run email/password sign-up, login and sign-out against an identity
//! provider:
//!
//! - `identity`: the `IdentityProvider` seam and its Firebase REST backend
//! - `api`: the backend client that records newly registered users
//! - `auth`: the `token` session cookie and cookie jars
//! - `page`: UI element bindings and the visibility sync run on page load
//! - `flows`: the `AuthContext` and the three auth workflows
//! - `config`: configuration loading

pub mod api;
pub mod auth;
pub mod config;
pub mod flows;
pub mod identity;
pub mod page;

pub use api::{ApiError, BackendClient};
pub use auth::{parse_cookie_token, AuthState, CookieJar, FileCookieJar, MemoryCookieJar, SessionCookie};
pub use config::Config;
pub use flows::{AuthContext, AuthError, Credentials, Window};
pub use identity::{FirebaseApp, FirebaseAuth, FirebaseConfig, IdentityProvider, ProviderError, User};
pub use page::{BoundUi, ElementId, Page, UiBindings, UiError};
