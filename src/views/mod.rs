//! Screen controllers.
//!
//! Each view fetches what it needs when loaded, exposes a [`ViewState`] for
//! rendering, and turns form submissions into API calls. Views never touch
//! token storage; they read the session from the [`AuthGate`](crate::auth::AuthGate)
//! in their [`AppContext`](crate::AppContext).
//!
//! All async work runs inside the view's [`ViewScope`]. Once a view is
//! dropped or its scope cancelled, pending work resolves to
//! [`ViewError::Cancelled`] and never writes view state.

pub mod articles;
pub mod auth;
pub mod dashboard;
pub mod form;
pub mod issues;

pub use articles::{
    ArticleComposer, ArticleCreated, ArticleDetail, ArticleEditor, ArticleEditorData, ArticleForm,
    ArticleList,
};
pub use auth::{LoginForm, RegisterForm};
pub use dashboard::{Analytics, Dashboard, DashboardData};
pub use issues::{IssueDraft, IssueEditor, IssueList, IssuePage, IssuePageData};

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

use crate::api::ApiError;
use crate::auth::{AuthError, Route};

/// What a screen shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> ViewState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// A form field failed local validation. No request was sent.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("Please sign in to continue")]
    NotAuthenticated,

    #[error("{0}")]
    Session(String),

    /// The signed-in role may not perform this action.
    #[error("{0}")]
    Forbidden(String),

    #[error("A request is already in progress")]
    Busy,

    #[error("View closed before the request finished")]
    Cancelled,
}

impl ViewError {
    /// Where the user should be sent after this error, if anywhere.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            ViewError::NotAuthenticated | ViewError::Session(_) => Some(Route::Login),
            ViewError::Api(e) if e.is_unauthorized() => Some(Route::Login),
            _ => None,
        }
    }

    /// Message to show inline, using `fallback` where the error itself has
    /// nothing useful to say to a user.
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            ViewError::Api(ApiError::Network(_))
            | ViewError::Api(ApiError::Decode(_))
            | ViewError::Api(ApiError::InvalidRequest(_)) => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<AuthError> for ViewError {
    fn from(err: AuthError) -> Self {
        ViewError::Session(err.to_string())
    }
}

/// Cancellation boundary tied to a view's lifetime.
pub struct ViewScope {
    token: CancellationToken,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// A handle that cancels this scope from elsewhere.
    pub fn handle(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run `fut` unless the scope is cancelled first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ViewError>
    where
        F: Future<Output = Result<T, ViewError>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ViewError::Cancelled),
            result = fut => {
                if self.token.is_cancelled() {
                    Err(ViewError::Cancelled)
                } else {
                    result
                }
            }
        }
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Per-view "request in flight" flag.
#[derive(Default)]
pub struct BusyFlag {
    busy: AtomicBool,
}

impl BusyFlag {
    pub fn try_acquire(&self) -> Result<BusyGuard<'_>, ViewError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard { flag: self })
            .map_err(|_| ViewError::Busy)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

pub struct BusyGuard<'a> {
    flag: &'a BusyFlag,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.busy.store(false, Ordering::Release);
    }
}

/// Explicit user confirmation before a destructive call.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_scope_runs_to_completion() {
        let scope = ViewScope::new();
        let value = scope.run(async { Ok::<_, ViewError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_cancelled_scope_drops_result() {
        let scope = ViewScope::new();
        let handle = scope.handle();

        let work = scope.run(async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, ViewError>(())
        });
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.cancel();
        };

        let (result, _) = tokio::join!(work, cancel);
        assert_eq!(result, Err(ViewError::Cancelled));
        assert!(scope.is_cancelled());
    }

    #[test]
    fn test_drop_cancels_scope() {
        let scope = ViewScope::new();
        let handle = scope.handle();
        drop(scope);
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_busy_flag_rejects_reentry() {
        let flag = BusyFlag::default();
        let guard = flag.try_acquire().unwrap();
        assert!(flag.is_busy());
        assert!(matches!(flag.try_acquire(), Err(ViewError::Busy)));
        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_acquire().is_ok());
    }

    #[test]
    fn test_redirects() {
        assert_eq!(ViewError::NotAuthenticated.redirect(), Some(Route::Login));
        assert_eq!(
            ViewError::Api(ApiError::from_response(401, "")).redirect(),
            Some(Route::Login)
        );
        assert_eq!(ViewError::Validation("x".into()).redirect(), None);
    }

    #[test]
    fn test_message_or_hides_transport_details() {
        let err = ViewError::Api(ApiError::Network("tcp reset".into()));
        assert_eq!(err.message_or("Failed to delete article"), "Failed to delete article");

        let err = ViewError::Api(ApiError::from_response(400, r#"{"msg":"Slug taken"}"#));
        assert_eq!(err.message_or("Failed to update article"), "Slug taken");
    }
}
