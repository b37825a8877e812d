//! Login and registration forms.

use parking_lot::Mutex;
use tracing::{info, warn};

use super::form::Validator;
use super::{BusyFlag, ViewError, ViewScope};
use crate::api::{ApiError, LoginRequest, RegisterRequest};
use crate::auth::Route;
use crate::session::Role;
use crate::AppContext;

const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
const REGISTER_FAILED: &str = "Registration failed. Please try again.";
const CONNECTION_FAILED: &str = "Connection error. Please try again later.";

/// Message for a failed auth form submission. Only a `message`/`msg` field
/// from the server replaces the form's default wording.
fn form_error(err: &ViewError, fallback: &str) -> String {
    match err {
        ViewError::Api(ApiError::Network(_)) => CONNECTION_FAILED.to_string(),
        ViewError::Api(api) => api
            .server_message()
            .map_or_else(|| fallback.to_string(), str::to_string),
        ViewError::Validation(message) => message.clone(),
        _ => fallback.to_string(),
    }
}

pub struct LoginForm {
    ctx: AppContext,
    scope: ViewScope,
    busy: BusyFlag,
    error: Mutex<Option<String>>,
}

impl LoginForm {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            scope: ViewScope::new(),
            busy: BusyFlag::default(),
            error: Mutex::new(None),
        }
    }

    pub fn error(&self) -> Option<String> {
        self.error.lock().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.busy.is_busy()
    }

    /// Sign in and hand the token to the auth gate. On success the caller
    /// navigates to the returned route.
    pub async fn submit(&self, username: &str, password: &str) -> Result<Route, ViewError> {
        let result = self.try_submit(username, password).await;
        match &result {
            Ok(_) => *self.error.lock() = None,
            Err(ViewError::Cancelled) | Err(ViewError::Busy) => {}
            Err(e) => {
                warn!(username, error = %e, "Login failed");
                *self.error.lock() = Some(form_error(e, LOGIN_FAILED));
            }
        }
        result
    }

    async fn try_submit(&self, username: &str, password: &str) -> Result<Route, ViewError> {
        let mut validator = Validator::new();
        validator
            .required("username", username, "Username is required")
            .required("password", password, "Password is required");
        validator.finish()?;

        let _busy = self.busy.try_acquire()?;
        let api = self.ctx.api.clone();
        let request = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let response = self
            .scope
            .run(async move { api.login(&request).await.map_err(ViewError::from) })
            .await?;

        let session = self.ctx.gate.establish(&response.token)?;
        info!(user = %session.user.username, "Logged in");
        Ok(Route::Dashboard)
    }
}

pub struct RegisterForm {
    ctx: AppContext,
    scope: ViewScope,
    busy: BusyFlag,
    error: Mutex<Option<String>>,
}

impl RegisterForm {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            scope: ViewScope::new(),
            busy: BusyFlag::default(),
            error: Mutex::new(None),
        }
    }

    pub fn error(&self) -> Option<String> {
        self.error.lock().clone()
    }

    /// Create an account. New accounts are writers unless `role` says
    /// otherwise. The user is sent to the login screen afterwards.
    pub async fn submit(
        &self,
        username: &str,
        password: &str,
        role: Option<Role>,
    ) -> Result<Route, ViewError> {
        let result = self.try_submit(username, password, role.unwrap_or_default()).await;
        match &result {
            Ok(_) => *self.error.lock() = None,
            Err(ViewError::Cancelled) | Err(ViewError::Busy) => {}
            Err(e) => {
                warn!(username, error = %e, "Registration failed");
                *self.error.lock() = Some(form_error(e, REGISTER_FAILED));
            }
        }
        result
    }

    async fn try_submit(&self, username: &str, password: &str, role: Role) -> Result<Route, ViewError> {
        let mut validator = Validator::new();
        validator
            .required("username", username, "Username is required")
            .required("password", password, "Password is required");
        validator.finish()?;

        let _busy = self.busy.try_acquire()?;
        let api = self.ctx.api.clone();
        let request = RegisterRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
            role,
        };
        self.scope
            .run(async move { api.register(&request).await.map_err(ViewError::from) })
            .await?;

        info!(username, %role, "Account registered");
        Ok(Route::Login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RequestBody;
    use crate::auth::AuthState;
    use crate::session::testing::{admin_token, writer_token};
    use crate::views::testing::context;
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_login_establishes_session() {
        let (ctx, mock) = context(None);
        mock.on_json(Method::POST, "/api/auth/login", 200, json!({"token": admin_token()}));
        let gate = ctx.gate.clone();

        let form = LoginForm::new(ctx);
        assert_eq!(form.submit("alice", "secret").await, Ok(Route::Dashboard));
        assert!(gate.session().unwrap().is_admin());
        assert_eq!(form.error(), None);
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let (ctx, mock) = context(None);
        let form = LoginForm::new(ctx);

        let err = form.submit("", "secret").await.unwrap_err();
        assert_eq!(err, ViewError::Validation("Username is required".into()));
        let err = form.submit("alice", " ").await.unwrap_err();
        assert_eq!(err, ViewError::Validation("Password is required".into()));
        assert_eq!(form.error().as_deref(), Some("Password is required"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_login_error_messages() {
        let (ctx, mock) = context(None);
        let gate = ctx.gate.clone();
        let form = LoginForm::new(ctx);

        mock.on(Method::POST, "/api/auth/login", 400, r#"{"msg":"Invalid credentials"}"#);
        assert!(form.submit("alice", "wrong").await.is_err());
        assert_eq!(form.error().as_deref(), Some("Invalid credentials"));

        mock.on(Method::POST, "/api/auth/login", 500, "");
        assert!(form.submit("alice", "wrong").await.is_err());
        assert_eq!(form.error().as_deref(), Some(LOGIN_FAILED));

        mock.fail(Method::POST, "/api/auth/login", "connection refused");
        assert!(form.submit("alice", "wrong").await.is_err());
        assert_eq!(form.error().as_deref(), Some(CONNECTION_FAILED));

        assert_eq!(gate.state(), AuthState::Anonymous { reason: None });
    }

    #[tokio::test]
    async fn test_login_hides_unexplained_error_bodies() {
        let (ctx, mock) = context(None);
        let form = LoginForm::new(ctx);

        mock.on(Method::POST, "/api/auth/login", 502, "<html>Bad Gateway</html>");
        assert!(form.submit("alice", "secret").await.is_err());
        assert_eq!(form.error().as_deref(), Some(LOGIN_FAILED));

        mock.on(
            Method::POST,
            "/api/auth/login",
            400,
            r#"{"errors":[{"msg":"Password too short"}]}"#,
        );
        assert!(form.submit("alice", "secret").await.is_err());
        assert_eq!(form.error().as_deref(), Some(LOGIN_FAILED));

        mock.on(Method::POST, "/api/auth/login", 401, r#"{"message":"Invalid credentials"}"#);
        assert!(form.submit("alice", "secret").await.is_err());
        assert_eq!(form.error().as_deref(), Some("Invalid credentials"));
    }

    #[tokio::test]
    async fn test_login_with_unusable_token() {
        let (ctx, mock) = context(None);
        mock.on_json(Method::POST, "/api/auth/login", 200, json!({"token": "not-a-jwt"}));
        let gate = ctx.gate.clone();

        let form = LoginForm::new(ctx);
        let err = form.submit("alice", "secret").await.unwrap_err();
        assert_eq!(err.redirect(), Some(Route::Login));
        assert_eq!(form.error().as_deref(), Some(LOGIN_FAILED));
        assert!(!gate.is_authenticated());
    }

    #[tokio::test]
    async fn test_register_defaults_to_writer() {
        let (ctx, mock) = context(None);
        mock.on_json(Method::POST, "/api/auth/register", 200, json!({"msg": "User registered"}));

        let form = RegisterForm::new(ctx);
        assert_eq!(form.submit("carol", "pw", None).await, Ok(Route::Login));

        let sent = mock.requests();
        assert_eq!(
            sent[0].body,
            RequestBody::Json(json!({"username": "carol", "password": "pw", "role": "writer"}))
        );
    }

    #[tokio::test]
    async fn test_register_failure_messages() {
        let (ctx, mock) = context(Some(writer_token()));
        let form = RegisterForm::new(ctx);

        mock.on(Method::POST, "/api/auth/register", 400, r#"{"msg":"User already exists"}"#);
        assert!(form.submit("bob", "pw", Some(Role::Writer)).await.is_err());
        assert_eq!(form.error().as_deref(), Some("User already exists"));

        mock.on(Method::POST, "/api/auth/register", 200, "<html>");
        assert!(form.submit("bob", "pw", None).await.is_err());
        assert_eq!(form.error().as_deref(), Some(REGISTER_FAILED));

        mock.on(Method::POST, "/api/auth/register", 503, "<html>Service Unavailable</html>");
        assert!(form.submit("bob", "pw", None).await.is_err());
        assert_eq!(form.error().as_deref(), Some(REGISTER_FAILED));

        mock.on(Method::POST, "/api/auth/register", 422, r#"{"code":11000}"#);
        assert!(form.submit("bob", "pw", None).await.is_err());
        assert_eq!(form.error().as_deref(), Some(REGISTER_FAILED));
    }
}
