//! Auth gate.
//!
//! Owns the session for the whole client. The gate is the only component
//! that reads or writes the persisted token; views receive a cloned handle
//! and observe changes through [`AuthGate::subscribe`].
//!
//! ```text
//!   Anonymous --establish(token) / restore()--> Authenticated
//!   Authenticated --logout / expiry / bad token / 401--> Anonymous
//! ```
//!
//! Entering Anonymous clears the persisted token and yields [`Route::Login`]
//! as the redirect target. Entering Authenticated (re)writes the token.

pub mod route;

pub use route::{Route, RouteDecision};

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::Credentials;
use crate::session::{decode_token_at, Session, SessionError};
use crate::store::{StoreError, TokenStore};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    UserRequested,
    /// The persisted token was removed outside this process.
    SignedOutElsewhere,
    Expired,
    InvalidToken,
    Unauthorized,
}

impl std::fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserRequested => write!(f, "signed out"),
            Self::SignedOutElsewhere => write!(f, "signed out in another session"),
            Self::Expired => write!(f, "session expired"),
            Self::InvalidToken => write!(f, "invalid session token"),
            Self::Unauthorized => write!(f, "session rejected by server"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous { reason: Option<LogoutReason> },
    Authenticated(Session),
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            AuthState::Anonymous { .. } => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("{0}")]
    Store(#[from] StoreError),
}

struct Inner {
    store: Arc<dyn TokenStore>,
    token: Mutex<Option<String>>,
    state: watch::Sender<AuthState>,
}

/// Cheap-to-clone handle to the client's session.
#[derive(Clone)]
pub struct AuthGate {
    inner: Arc<Inner>,
}

impl AuthGate {
    /// A gate in the Anonymous state. Call [`restore`](Self::restore) to pick
    /// up a persisted token.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(AuthState::Anonymous { reason: None });
        Self {
            inner: Arc::new(Inner {
                store,
                token: Mutex::new(None),
                state,
            }),
        }
    }

    /// Re-establish the session from the persisted token, if it is still
    /// valid. An unusable persisted token is cleared.
    pub fn restore(&self) -> AuthState {
        let token = match self.inner.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not read persisted token");
                None
            }
        };

        match token {
            Some(token) => match decode_token_at(&token, Utc::now()) {
                Ok(session) => {
                    info!(user = %session.user.username, role = %session.user.role, "Session restored");
                    self.enter_authenticated(token, session);
                }
                Err(SessionError::Expired) => {
                    self.logout(LogoutReason::Expired);
                }
                Err(e) => {
                    debug!(error = %e, "Persisted token unusable");
                    self.logout(LogoutReason::InvalidToken);
                }
            },
            None => debug!("No persisted token"),
        }

        self.state()
    }

    /// Enter Authenticated with a freshly issued token.
    pub fn establish(&self, token: &str) -> Result<Session, AuthError> {
        let session = match decode_token_at(token, Utc::now()) {
            Ok(session) => session,
            Err(e) => {
                let reason = if e == SessionError::Expired {
                    LogoutReason::Expired
                } else {
                    LogoutReason::InvalidToken
                };
                self.logout(reason);
                return Err(e.into());
            }
        };

        self.inner.store.save(token)?;
        info!(user = %session.user.username, role = %session.user.role, "Signed in");
        self.enter_authenticated(token.to_string(), session.clone());
        Ok(session)
    }

    /// Enter Anonymous. Always succeeds in memory; a failure to clear the
    /// persisted token is logged.
    pub fn logout(&self, reason: LogoutReason) -> Route {
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear persisted token");
        }
        let was_authenticated = self.inner.token.lock().take().is_some();
        if was_authenticated {
            info!(%reason, "Session ended");
        }
        self.inner.state.send_replace(AuthState::Anonymous {
            reason: Some(reason),
        });
        Route::Login
    }

    fn enter_authenticated(&self, token: String, session: Session) {
        *self.inner.token.lock() = Some(token);
        self.inner.state.send_replace(AuthState::Authenticated(session));
    }

    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// The current session if it is still valid. An expired session is
    /// ended on the spot.
    pub fn session(&self) -> Option<Session> {
        let session = self.inner.state.borrow().session().cloned()?;
        if session.is_expired_at(Utc::now()) {
            self.logout(LogoutReason::Expired);
            return None;
        }
        Some(session)
    }

    /// Bring the in-memory state in line with the persisted token, which
    /// may have been changed by another process.
    fn sync_with_store(&self) {
        let persisted = match self.inner.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not read persisted token");
                return;
            }
        };
        let current = self.inner.token.lock().clone();

        match (current, persisted) {
            (Some(_), None) => {
                self.logout(LogoutReason::SignedOutElsewhere);
            }
            (current, Some(persisted)) if current.as_deref() != Some(persisted.as_str()) => {
                self.restore();
            }
            _ => {}
        }
    }

    /// Decide whether `route` may render. Protected routes need a valid
    /// session; otherwise the caller is sent to the login screen.
    pub fn guard(&self, route: &Route) -> RouteDecision {
        if *route == Route::Home {
            return RouteDecision::Redirect(Route::Dashboard);
        }
        if !route.is_protected() {
            return RouteDecision::Render(route.clone());
        }

        self.sync_with_store();
        match self.session() {
            Some(_) => RouteDecision::Render(route.clone()),
            None => {
                debug!(route = %route, "Protected route requires login");
                RouteDecision::Redirect(Route::Login)
            }
        }
    }
}

impl Credentials for AuthGate {
    fn bearer(&self) -> Option<String> {
        self.session()?;
        self.inner.token.lock().clone()
    }

    fn revoke(&self) {
        self.logout(LogoutReason::Unauthorized);
    }
}
