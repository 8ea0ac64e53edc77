//! Integration tests for the sign-up, login and sign-out workflows.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use caplab_core::{
    identity::Endpoints, AuthContext, AuthState, BackendClient, BoundUi, CookieJar, Credentials,
    ElementId, FirebaseApp, FirebaseConfig, IdentityProvider, MemoryCookieJar, Page, UiBindings,
    Window,
};
use async_trait::async_trait;
use caplab_core::auth::CookieError;
use caplab_core::identity::{TokenSet, User};
use caplab_core::ProviderError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Default)]
struct RecordingWindow {
    alerts: Mutex<Vec<String>>,
    navigations: Mutex<Vec<String>>,
}

impl RecordingWindow {
    fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

impl Window for RecordingWindow {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    fn navigate(&self, path: &str) {
        self.navigations.lock().unwrap().push(path.to_string());
    }
}

/// Memory jar that also records every raw assignment.
#[derive(Default)]
struct RecordingJar {
    inner: MemoryCookieJar,
    writes: Mutex<Vec<String>>,
}

impl RecordingJar {
    fn seeded(cookie: &str) -> Self {
        Self {
            inner: MemoryCookieJar::with_cookies(cookie).unwrap(),
            writes: Mutex::new(Vec::new()),
        }
    }

    fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

impl CookieJar for RecordingJar {
    fn cookie_string(&self) -> String {
        self.inner.cookie_string()
    }

    fn write(&self, assignment: &str) -> Result<(), CookieError> {
        self.writes.lock().unwrap().push(assignment.to_string());
        self.inner.write(assignment)
    }
}

struct FormPage {
    hidden: HashMap<&'static str, bool>,
    values: HashMap<&'static str, String>,
}

impl FormPage {
    fn new(email: &str, password: &str) -> Self {
        let hidden = ElementId::ALL.iter().map(|e| (e.default_id(), false)).collect();
        let mut values = HashMap::new();
        values.insert("email", email.to_string());
        values.insert("password", password.to_string());
        Self { hidden, values }
    }
}

impl Page for FormPage {
    fn contains(&self, id: &str) -> bool {
        self.hidden.contains_key(id)
    }

    fn set_hidden(&mut self, id: &str, hidden: bool) {
        if let Some(h) = self.hidden.get_mut(id) {
            *h = hidden;
        }
    }

    fn is_hidden(&self, id: &str) -> bool {
        self.hidden.get(id).copied().unwrap_or(true)
    }

    fn value(&self, id: &str) -> String {
        self.values.get(id).cloned().unwrap_or_default()
    }
}

/// Provider that hands out accounts but fails every token and sign-out call.
struct FailingProvider;

#[async_trait]
impl IdentityProvider for FailingProvider {
    async fn create_account(&self, email: &str, _password: &str) -> Result<User, ProviderError> {
        Ok(User {
            uid: "uid-9".to_string(),
            email: Some(email.to_string()),
            tokens: TokenSet::new("unused".into(), "refresh".into(), 3600),
        })
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> Result<User, ProviderError> {
        Err(ProviderError::from_code("auth/user-disabled"))
    }

    async fn id_token(&self, _user: &User) -> Result<String, ProviderError> {
        Err(ProviderError::from_code("auth/user-token-expired"))
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        Err(ProviderError::from_code("auth/internal-error"))
    }

    fn current_user(&self) -> Option<User> {
        None
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn failing_context(backend_uri: &str, jar: Arc<RecordingJar>) -> AuthContext {
    let backend = BackendClient::new(backend_uri, jar.clone()).unwrap();
    AuthContext::new(Arc::new(FailingProvider), backend, jar)
}

fn context(server_uri: &str, backend_uri: &str, jar: Arc<RecordingJar>) -> AuthContext {
    let config = FirebaseConfig {
        api_key: "test-key".to_string(),
        project_id: "demo-caplab".to_string(),
        ..Default::default()
    };
    let app = FirebaseApp::initialize(config)
        .unwrap()
        .with_endpoints(Endpoints::with_base(server_uri));
    let backend = BackendClient::new(backend_uri, jar.clone()).unwrap();
    AuthContext::new(Arc::new(app.auth()), backend, jar)
}

fn password_response(uid: &str, email: &str, id_token: &str, expires_in: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "kind": "identitytoolkit#SignupNewUserResponse",
        "localId": uid,
        "email": email,
        "idToken": id_token,
        "refreshToken": "refresh-1",
        "expiresIn": expires_in,
    }))
}

fn rest_error(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "error": {
            "code": 400,
            "message": message,
            "errors": [{ "message": message, "domain": "global", "reason": "invalid" }],
        }
    }))
}

// ============================================================================
// Sign-up
// ============================================================================

#[tokio::test]
async fn test_sign_up_success_registers_and_navigates_home() {
    let server = MockServer::start().await;
    let jar = Arc::new(RecordingJar::default());
    let ctx = context(&server.uri(), &server.uri(), jar.clone());
    let window = RecordingWindow::default();

    Mock::given(method("POST"))
        .and(path("/accounts:signUp"))
        .and(query_param("key", "test-key"))
        .and(body_json(json!({
            "email": "new@example.com",
            "password": "hunter22",
            "returnSecureToken": true,
        })))
        .respond_with(password_response("uid-1", "new@example.com", "tok123", "3600"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/register-user"))
        .and(header("authorization", "Bearer tok123"))
        .and(header("content-type", "application/json"))
        .and(header("cookie", "token=tok123"))
        .and(body_json(json!({ "uid": "uid-1", "email": "new@example.com" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    ctx.sign_up(Credentials::new("new@example.com", "hunter22"), &window)
        .await;

    assert_eq!(jar.writes(), vec!["token=tok123;path=/;SameSite=Strict"]);
    assert_eq!(window.navigations(), vec!["/"]);
    assert!(window.alerts().is_empty());
}

#[tokio::test]
async fn test_sign_up_backend_failure_alerts_and_keeps_cookie() {
    let server = MockServer::start().await;
    let jar = Arc::new(RecordingJar::default());
    let ctx = context(&server.uri(), &server.uri(), jar.clone());
    let window = RecordingWindow::default();

    Mock::given(method("POST"))
        .and(path("/accounts:signUp"))
        .respond_with(password_response("uid-1", "new@example.com", "tok123", "3600"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/register-user"))
        .respond_with(ResponseTemplate::new(500).set_body_string("firestore unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    ctx.sign_up(Credentials::new("new@example.com", "hunter22"), &window)
        .await;

    let alerts = window.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].contains("Sign-up failed:"));
    assert_eq!(alerts[0], "Sign-up failed: Failed to register user in backend");
    // Status and body stay out of the user-facing message
    assert!(!alerts[0].contains("500"));

    // No rollback: the token stays in the cookie
    assert_eq!(jar.cookie_string(), "token=tok123");
    assert!(window.navigations().is_empty());
}

#[tokio::test]
async fn test_sign_up_provider_rejection_skips_backend() {
    let server = MockServer::start().await;
    let jar = Arc::new(RecordingJar::default());
    let ctx = context(&server.uri(), &server.uri(), jar.clone());
    let window = RecordingWindow::default();

    Mock::given(method("POST"))
        .and(path("/accounts:signUp"))
        .respond_with(rest_error("EMAIL_EXISTS"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/register-user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    ctx.sign_up(Credentials::new("taken@example.com", "hunter22"), &window)
        .await;

    assert_eq!(
        window.alerts(),
        vec!["Sign-up failed: Firebase: Error (auth/email-already-in-use)."]
    );
    assert!(jar.writes().is_empty());
    assert!(window.navigations().is_empty());
}

#[tokio::test]
async fn test_sign_up_weak_password_shows_provider_detail() {
    let server = MockServer::start().await;
    let jar = Arc::new(RecordingJar::default());
    let ctx = context(&server.uri(), &server.uri(), jar.clone());
    let window = RecordingWindow::default();

    Mock::given(method("POST"))
        .and(path("/accounts:signUp"))
        .respond_with(rest_error(
            "WEAK_PASSWORD : Password should be at least 6 characters",
        ))
        .mount(&server)
        .await;

    ctx.sign_up(Credentials::new("new@example.com", "123"), &window)
        .await;

    assert_eq!(
        window.alerts(),
        vec!["Sign-up failed: Firebase: Password should be at least 6 characters (auth/weak-password)."]
    );
}

#[tokio::test]
async fn test_sign_up_unreachable_backend_is_network_error() {
    let server = MockServer::start().await;
    let jar = Arc::new(RecordingJar::default());
    // Nothing listens on port 1
    let ctx = context(&server.uri(), "http://127.0.0.1:1", jar.clone());
    let window = RecordingWindow::default();

    Mock::given(method("POST"))
        .and(path("/accounts:signUp"))
        .respond_with(password_response("uid-1", "new@example.com", "tok123", "3600"))
        .mount(&server)
        .await;

    ctx.sign_up(Credentials::new("new@example.com", "hunter22"), &window)
        .await;

    let alerts = window.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].starts_with("Sign-up failed: Network error"));
    assert_eq!(jar.cookie_string(), "token=tok123");
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_success_sets_cookie_without_backend_call() {
    let server = MockServer::start().await;
    let jar = Arc::new(RecordingJar::default());
    let ctx = context(&server.uri(), &server.uri(), jar.clone());
    let window = RecordingWindow::default();

    Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .and(query_param("key", "test-key"))
        .respond_with(password_response("uid-7", "me@example.com", "login-token", "3600"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/register-user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    ctx.login(Credentials::new("me@example.com", "hunter22"), &window)
        .await;

    assert_eq!(jar.writes(), vec!["token=login-token;path=/;SameSite=Strict"]);
    assert_eq!(window.navigations(), vec!["/"]);
    assert!(window.alerts().is_empty());
    assert_eq!(ctx.provider().current_user().map(|u| u.uid), Some("uid-7".to_string()));
}

#[tokio::test]
async fn test_login_wrong_password_alerts_without_cookie() {
    let server = MockServer::start().await;
    let jar = Arc::new(RecordingJar::default());
    let ctx = context(&server.uri(), &server.uri(), jar.clone());
    let window = RecordingWindow::default();

    Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .respond_with(rest_error("INVALID_PASSWORD"))
        .mount(&server)
        .await;

    ctx.login(Credentials::new("me@example.com", "wrong"), &window)
        .await;

    assert!(jar.writes().is_empty());
    assert_eq!(jar.cookie_string(), "");
    let alerts = window.alerts();
    assert_eq!(alerts, vec!["Login failed: Firebase: Error (auth/wrong-password)."]);
    assert!(window.navigations().is_empty());
}

#[tokio::test]
async fn test_login_refreshes_token_near_expiry() {
    let server = MockServer::start().await;
    let jar = Arc::new(RecordingJar::default());
    let ctx = context(&server.uri(), &server.uri(), jar.clone());
    let window = RecordingWindow::default();

    // A 60 second token is already inside the refresh buffer
    Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .respond_with(password_response("uid-7", "me@example.com", "stale-token", "60"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "expires_in": "3600",
            "token_type": "Bearer",
            "refresh_token": "refresh-2",
            "id_token": "fresh-token",
            "user_id": "uid-7",
            "project_id": "demo-caplab",
        })))
        .expect(1)
        .mount(&server)
        .await;

    ctx.login(Credentials::new("me@example.com", "hunter22"), &window)
        .await;

    assert_eq!(jar.cookie_string(), "token=fresh-token");
    let user = ctx.provider().current_user().unwrap();
    assert_eq!(user.tokens.id_token, "fresh-token");
    assert_eq!(user.tokens.refresh_token, "refresh-2");
}

#[tokio::test]
async fn test_login_unreachable_provider_alerts_network_failure() {
    let jar = Arc::new(RecordingJar::default());
    let ctx = context("http://127.0.0.1:1", "http://127.0.0.1:1", jar.clone());
    let window = RecordingWindow::default();

    ctx.login(Credentials::new("me@example.com", "hunter22"), &window)
        .await;

    assert_eq!(
        window.alerts(),
        vec!["Login failed: Firebase: Error (auth/network-request-failed)."]
    );
    assert!(jar.writes().is_empty());
}

#[tokio::test]
async fn test_login_out_of_range_lifetime_uses_default() {
    let server = MockServer::start().await;
    let jar = Arc::new(RecordingJar::default());
    let ctx = context(&server.uri(), &server.uri(), jar.clone());
    let window = RecordingWindow::default();

    Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .respond_with(password_response(
            "uid-7",
            "me@example.com",
            "login-token",
            "99999999999999",
        ))
        .expect(1)
        .mount(&server)
        .await;

    // A clamped lifetime is fresh, so no refresh happens
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    ctx.login(Credentials::new("me@example.com", "hunter22"), &window)
        .await;

    assert!(window.alerts().is_empty());
    assert_eq!(window.navigations(), vec!["/"]);
    assert_eq!(jar.cookie_string(), "token=login-token");
    let user = ctx.provider().current_user().unwrap();
    assert_eq!(user.tokens.expires_in_secs, 3600);
}

// ============================================================================
// Sign-out
// ============================================================================

#[tokio::test]
async fn test_sign_out_clears_cookie_and_navigates_home() {
    let server = MockServer::start().await;
    let jar = Arc::new(RecordingJar::seeded("theme=dark; token=abc"));
    let ctx = context(&server.uri(), &server.uri(), jar.clone());
    let window = RecordingWindow::default();

    ctx.sign_out(&window).await;

    assert_eq!(jar.writes(), vec!["token=;path=/;SameSite=Strict"]);
    assert_eq!(jar.cookie_string(), "theme=dark; token=");
    assert_eq!(window.navigations(), vec!["/"]);
    assert!(window.alerts().is_empty());
}

#[tokio::test]
async fn test_sign_out_failure_is_silent_and_keeps_cookie() {
    let jar = Arc::new(RecordingJar::seeded("token=abc"));
    let ctx = failing_context("http://127.0.0.1:1", jar.clone());
    let window = RecordingWindow::default();

    ctx.sign_out(&window).await;

    assert!(window.alerts().is_empty());
    assert!(window.navigations().is_empty());
    assert!(jar.writes().is_empty());
    assert_eq!(jar.cookie_string(), "token=abc");
}

#[tokio::test]
async fn test_sign_up_token_failure_alerts_without_cookie() {
    let backend = MockServer::start().await;
    let jar = Arc::new(RecordingJar::default());
    let ctx = failing_context(&backend.uri(), jar.clone());
    let window = RecordingWindow::default();

    Mock::given(method("POST"))
        .and(path("/register-user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend)
        .await;

    ctx.sign_up(Credentials::new("new@example.com", "hunter22"), &window)
        .await;

    let alerts = window.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].starts_with("Sign-up failed:"));
    assert_eq!(
        alerts[0],
        "Sign-up failed: Firebase: Error (auth/user-token-expired)."
    );
    assert!(jar.writes().is_empty());
    assert!(window.navigations().is_empty());
}

// ============================================================================
// Page lifecycle
// ============================================================================

#[tokio::test]
async fn test_page_state_follows_login_and_sign_out() {
    let server = MockServer::start().await;
    let jar = Arc::new(RecordingJar::default());
    let ctx = context(&server.uri(), &server.uri(), jar.clone());
    let window = RecordingWindow::default();

    Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .respond_with(password_response("uid-7", "me@example.com", "login-token", "3600"))
        .mount(&server)
        .await;

    let mut page = FormPage::new("me@example.com", "hunter22");
    let ui = BoundUi::resolve(&page, UiBindings::default()).unwrap();

    assert_eq!(ctx.load(&ui, &mut page), AuthState::Unauthenticated);
    assert!(!page.is_hidden("login-box"));
    assert!(page.is_hidden("sign-out"));

    ctx.login(ui.credentials(&page), &window).await;
    // Visibility only changes on the next load
    assert!(!page.is_hidden("login-box"));

    assert_eq!(ctx.load(&ui, &mut page), AuthState::Authenticated);
    assert!(page.is_hidden("login-box"));
    assert!(!page.is_hidden("sign-out"));

    ctx.sign_out(&window).await;
    assert_eq!(ctx.load(&ui, &mut page), AuthState::Unauthenticated);
    assert!(!page.is_hidden("login-box"));
    assert!(page.is_hidden("sign-out"));

    assert_eq!(window.navigations(), vec!["/", "/"]);
}
