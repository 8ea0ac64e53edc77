//! UI element bindings and the page-load visibility sync.
//!
//! A host exposes its controls through the `Page` trait. The elements the
//! auth flows need are listed in `UiBindings` and resolved once into a
//! `BoundUi`; a page missing any of them is reported as `UiError::NotReady`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::auth::{parse_cookie_token, AuthState};
use crate::flows::Credentials;

/// Elements the auth flows read or toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    LoginBox,
    SignOut,
    Email,
    Password,
    SignUp,
    Login,
}

impl ElementId {
    pub const ALL: [ElementId; 6] = [
        ElementId::LoginBox,
        ElementId::SignOut,
        ElementId::Email,
        ElementId::Password,
        ElementId::SignUp,
        ElementId::Login,
    ];

    /// The conventional element id.
    pub fn default_id(&self) -> &'static str {
        match self {
            ElementId::LoginBox => "login-box",
            ElementId::SignOut => "sign-out",
            ElementId::Email => "email",
            ElementId::Password => "password",
            ElementId::SignUp => "sign-up",
            ElementId::Login => "login",
        }
    }
}

/// Element ids the flows are wired to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiBindings {
    pub login_box: String,
    pub sign_out: String,
    pub email: String,
    pub password: String,
    pub sign_up: String,
    pub login: String,
}

impl Default for UiBindings {
    fn default() -> Self {
        Self {
            login_box: ElementId::LoginBox.default_id().to_string(),
            sign_out: ElementId::SignOut.default_id().to_string(),
            email: ElementId::Email.default_id().to_string(),
            password: ElementId::Password.default_id().to_string(),
            sign_up: ElementId::SignUp.default_id().to_string(),
            login: ElementId::Login.default_id().to_string(),
        }
    }
}

impl UiBindings {
    pub fn id(&self, element: ElementId) -> &str {
        match element {
            ElementId::LoginBox => &self.login_box,
            ElementId::SignOut => &self.sign_out,
            ElementId::Email => &self.email,
            ElementId::Password => &self.password,
            ElementId::SignUp => &self.sign_up,
            ElementId::Login => &self.login,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UiError {
    #[error("UI not ready: missing element(s) {}", .0.join(", "))]
    NotReady(Vec<String>),
}

/// The host's element tree.
pub trait Page {
    fn contains(&self, id: &str) -> bool;

    fn set_hidden(&mut self, id: &str, hidden: bool);

    fn is_hidden(&self, id: &str) -> bool;

    /// Current value of an input element; empty for anything else.
    fn value(&self, id: &str) -> String;
}

/// Bindings validated against a page.
#[derive(Debug, Clone)]
pub struct BoundUi {
    bindings: UiBindings,
}

impl BoundUi {
    pub fn resolve<P: Page + ?Sized>(page: &P, bindings: UiBindings) -> Result<Self, UiError> {
        let missing: Vec<String> = ElementId::ALL
            .iter()
            .map(|e| bindings.id(*e))
            .filter(|id| !page.contains(id))
            .map(str::to_string)
            .collect();

        if !missing.is_empty() {
            return Err(UiError::NotReady(missing));
        }
        Ok(Self { bindings })
    }

    pub fn id(&self, element: ElementId) -> &str {
        self.bindings.id(element)
    }

    /// Map an element id back to the bound element, e.g. for a click target.
    pub fn element(&self, id: &str) -> Option<ElementId> {
        ElementId::ALL.into_iter().find(|e| self.bindings.id(*e) == id)
    }

    /// Show exactly one of the login box and the sign-out control, based on
    /// whether `cookie` carries a non-empty session token.
    pub fn update_ui<P: Page + ?Sized>(&self, page: &mut P, cookie: &str) -> AuthState {
        let token = parse_cookie_token(cookie);
        let state = AuthState::from_token(&token);
        let signed_in = state.is_authenticated();

        page.set_hidden(self.id(ElementId::LoginBox), signed_in);
        page.set_hidden(self.id(ElementId::SignOut), !signed_in);

        debug!(?state, "UI synced from cookie");
        state
    }

    /// Read the credential pair as it stands right now.
    pub fn credentials<P: Page + ?Sized>(&self, page: &P) -> Credentials {
        Credentials::new(
            page.value(self.id(ElementId::Email)),
            page.value(self.id(ElementId::Password)),
        )
    }
}
