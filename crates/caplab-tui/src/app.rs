//! Application state management for caplab.
//!
//! The `App` plays the role of the browser page: it owns the form elements,
//! runs the load handler, turns button presses into auth workflows and
//! applies the alerts and navigations those workflows send back.

use std::sync::Arc;

use anyhow::{Context, Result};
use caplab_core::{
    AuthContext, AuthState, BackendClient, BoundUi, Config, CookieJar, ElementId, FileCookieJar,
    FirebaseApp, Page, UiBindings, Window,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for email input (RFC 5321 path limit).
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Alerting,
    ConfirmingQuit,
    Quitting,
}

/// Focusable controls, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Email,
    Password,
    SignUp,
    Login,
    SignOut,
}

impl Focus {
    /// Controls reachable with the given visibility
    fn order(signed_in: bool) -> &'static [Focus] {
        if signed_in {
            &[Focus::SignOut]
        } else {
            &[Focus::Email, Focus::Password, Focus::SignUp, Focus::Login]
        }
    }

    pub fn next(self, signed_in: bool) -> Self {
        let order = Self::order(signed_in);
        match order.iter().position(|f| *f == self) {
            Some(i) => order[(i + 1) % order.len()],
            None => order[0],
        }
    }

    pub fn prev(self, signed_in: bool) -> Self {
        let order = Self::order(signed_in);
        match order.iter().position(|f| *f == self) {
            Some(i) => order[(i + order.len() - 1) % order.len()],
            None => order[0],
        }
    }

    /// The bound element a press on this control clicks, if it is a button.
    pub fn button(self) -> Option<ElementId> {
        match self {
            Focus::SignUp => Some(ElementId::SignUp),
            Focus::Login => Some(ElementId::Login),
            Focus::SignOut => Some(ElementId::SignOut),
            Focus::Email | Focus::Password => None,
        }
    }
}

// ============================================================================
// Page
// ============================================================================

/// The form elements shown on screen.
#[derive(Debug, Clone)]
pub struct Screen {
    pub login_box_hidden: bool,
    pub sign_out_hidden: bool,
    pub email: String,
    pub password: String,
}

impl Screen {
    pub fn new(email: String) -> Self {
        Self {
            login_box_hidden: false,
            sign_out_hidden: true,
            email,
            password: String::new(),
        }
    }
}

impl Page for Screen {
    fn contains(&self, id: &str) -> bool {
        ElementId::ALL.iter().any(|e| e.default_id() == id)
    }

    fn set_hidden(&mut self, id: &str, hidden: bool) {
        match id {
            "login-box" => self.login_box_hidden = hidden,
            "sign-out" => self.sign_out_hidden = hidden,
            _ => {}
        }
    }

    fn is_hidden(&self, id: &str) -> bool {
        match id {
            "login-box" | "email" | "password" | "sign-up" | "login" => self.login_box_hidden,
            "sign-out" => self.sign_out_hidden,
            _ => true,
        }
    }

    fn value(&self, id: &str) -> String {
        match id {
            "email" => self.email.clone(),
            "password" => self.password.clone(),
            _ => String::new(),
        }
    }
}

// ============================================================================
// Window
// ============================================================================

/// Effects sent back from running workflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Alert(String),
    Navigate(String),
    /// A workflow ran to completion
    Finished,
}

/// `Window` implementation that forwards effects to the main loop.
#[derive(Clone)]
pub struct ChannelWindow {
    tx: mpsc::UnboundedSender<PageEvent>,
}

impl ChannelWindow {
    /// Only fails once the app has shut down.
    fn send(&self, event: PageEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!(event = ?e.0, "Page closed, dropping event");
        }
    }

    fn finished(&self) {
        self.send(PageEvent::Finished);
    }
}

impl Window for ChannelWindow {
    fn alert(&self, message: &str) {
        self.send(PageEvent::Alert(message.to_string()));
    }

    fn navigate(&self, path: &str) {
        self.send(PageEvent::Navigate(path.to_string()));
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    context: Arc<AuthContext>,
    ui: BoundUi,

    // UI State
    pub screen: Screen,
    pub state: AppState,
    pub focus: Focus,
    pub auth_state: AuthState,
    pub alert: Option<String>,
    pub status_message: Option<String>,

    /// Workflows started but not yet finished
    pub in_flight: usize,

    window: ChannelWindow,
    events_rx: mpsc::UnboundedReceiver<PageEvent>,
}

impl App {
    /// Startup routine: build the auth context once and run the load handler.
    pub fn new(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        let cookies: Arc<dyn CookieJar> = Arc::new(
            FileCookieJar::open(&cache_dir).context("Failed to open cookie jar")?,
        );

        let firebase = FirebaseApp::initialize(config.firebase.clone())
            .with_context(|| {
                format!(
                    "Failed to initialize identity provider (set {})",
                    caplab_core::config::ENV_API_KEY
                )
            })?
            .with_endpoints(config.endpoints());
        debug!(endpoints = ?firebase.endpoints(), "Identity provider endpoints");

        let backend = BackendClient::new(&config.backend_url, Arc::clone(&cookies))
            .context("Failed to create backend client")?;
        debug!(backend_url = backend.base_url(), "Backend client ready");

        let context = Arc::new(AuthContext::new(Arc::new(firebase.auth()), backend, cookies));

        let (tx, rx) = mpsc::unbounded_channel();
        let screen = Screen::new(config.last_email.clone().unwrap_or_default());
        Self::with_context(config, context, screen, ChannelWindow { tx }, rx)
    }

    fn with_context(
        config: Config,
        context: Arc<AuthContext>,
        screen: Screen,
        window: ChannelWindow,
        events_rx: mpsc::UnboundedReceiver<PageEvent>,
    ) -> Result<Self> {
        let ui = BoundUi::resolve(&screen, UiBindings::default())?;

        let mut app = Self {
            config,
            context,
            ui,
            screen,
            state: AppState::Normal,
            focus: Focus::Email,
            auth_state: AuthState::Unauthenticated,
            alert: None,
            status_message: None,
            in_flight: 0,
            window,
            events_rx,
        };
        app.load();
        Ok(app)
    }

    /// Page-load handler
    pub fn load(&mut self) {
        self.auth_state = self.context.load(&self.ui, &mut self.screen);
        self.focus = if self.auth_state.is_authenticated() {
            Focus::SignOut
        } else if self.screen.email.is_empty() {
            Focus::Email
        } else {
            Focus::Password
        };
        info!(state = ?self.auth_state, "Page loaded");
    }

    pub fn is_signed_in_view(&self) -> bool {
        self.screen.login_box_hidden
    }

    // =========================================================================
    // Clicks
    // =========================================================================

    /// Press the focused control.
    pub fn press(&mut self) {
        match self.focus.button() {
            Some(element) => self.click(element),
            None => self.focus = self.focus.next(self.is_signed_in_view()),
        }
    }

    /// Dispatch a click on a bound element. Hidden controls cannot be clicked.
    pub fn click(&mut self, element: ElementId) {
        if self.screen.is_hidden(self.ui.id(element)) {
            debug!(?element, "Ignoring click on hidden element");
            return;
        }

        let context = Arc::clone(&self.context);
        let window = self.window.clone();

        match element {
            ElementId::SignUp | ElementId::Login => {
                let credentials = self.ui.credentials(&self.screen);
                self.remember_email(credentials.email());
                let signing_up = element == ElementId::SignUp;
                tokio::spawn(async move {
                    if signing_up {
                        context.sign_up(credentials, &window).await;
                    } else {
                        context.login(credentials, &window).await;
                    }
                    window.finished();
                });
            }
            ElementId::SignOut => {
                tokio::spawn(async move {
                    context.sign_out(&window).await;
                    window.finished();
                });
            }
            ElementId::LoginBox | ElementId::Email | ElementId::Password => return,
        }

        self.in_flight += 1;
        self.status_message = None;
    }

    fn remember_email(&mut self, email: &str) {
        if email.is_empty() || self.config.last_email.as_deref() == Some(email) {
            return;
        }
        self.config.last_email = Some(email.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    // =========================================================================
    // Page events
    // =========================================================================

    /// Apply alerts and navigations sent by running workflows.
    pub fn check_page_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                PageEvent::Alert(message) => {
                    self.alert = Some(message);
                    self.state = AppState::Alerting;
                }
                PageEvent::Navigate(path) => self.navigate(&path),
                PageEvent::Finished => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                }
            }
        }
    }

    /// Navigation reloads the page: the form resets and the load handler runs.
    fn navigate(&mut self, path: &str) {
        info!(path, "Navigating");
        self.screen.password.clear();
        self.screen.email = self.config.last_email.clone().unwrap_or_default();
        self.load();
        self.status_message = Some(if self.auth_state.is_authenticated() {
            "Signed in".to_string()
        } else {
            "Signed out".to_string()
        });
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
        self.state = AppState::Normal;
    }
}

// ============================================================================
// Input Validation
// ============================================================================

/// Check if a character is valid for text input (printable, non-control)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if an email character should be accepted
pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
