//! Session cookie handling.
//!
//! This module provides:
//! - `parse_cookie_token`: extracts the `token` value from a cookie string
//! - `SessionCookie`: renders the `token` cookie assignment
//! - `CookieJar`: the `document.cookie` view, with in-memory and file-backed jars
//!
//! The session token is opaque; its presence alone decides `AuthState`.

pub mod cookie;
pub mod jar;

pub use cookie::{parse_cookie_token, AuthState, SessionCookie, TOKEN_COOKIE};
pub use jar::{CookieError, CookieJar, FileCookieJar, MemoryCookieJar};
