//! Backend API client module.
//!
//! This module provides the `BackendClient` for notifying the application
//! backend about newly registered users.
//!
//! Requests are bearer-authenticated with the identity provider's id token
//! and carry the same-origin cookies, as a browser `fetch` would.

pub mod client;
pub mod error;

pub use client::{BackendClient, Registration, REGISTER_USER_PATH};
pub use error::ApiError;
