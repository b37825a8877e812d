//! Issue screens: the public list and detail page, and the admin editor.

use chrono::{Datelike, Utc};
use parking_lot::Mutex;
use tracing::{info, warn};

use super::form::Validator;
use super::{BusyFlag, ViewError, ViewScope, ViewState};
use crate::api::{Article, Issue, IssueInput};
use crate::auth::Route;
use crate::AppContext;

const LIST_FAILED: &str = "Failed to load issues";
const PAGE_FAILED: &str = "Failed to load issue data";
const SAVE_FAILED: &str = "Failed to save issue";

/// All issues, newest first as returned by the server.
pub struct IssueList {
    ctx: AppContext,
    scope: ViewScope,
    state: Mutex<ViewState<Vec<Issue>>>,
}

impl IssueList {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            scope: ViewScope::new(),
            state: Mutex::new(ViewState::Loading),
        }
    }

    pub fn state(&self) -> ViewState<Vec<Issue>> {
        self.state.lock().clone()
    }

    pub async fn load(&self) -> Result<(), ViewError> {
        let api = self.ctx.api.clone();
        let result = self
            .scope
            .run(async move { api.list_issues().await.map_err(ViewError::from) })
            .await;

        match result {
            Ok(issues) => {
                *self.state.lock() = ViewState::Ready(issues);
                Ok(())
            }
            Err(ViewError::Cancelled) => Err(ViewError::Cancelled),
            Err(e) => {
                *self.state.lock() = ViewState::Failed(e.message_or(LIST_FAILED));
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssuePageData {
    pub issue: Issue,
    /// Published articles only.
    pub articles: Vec<Article>,
}

/// Public page for one issue.
pub struct IssuePage {
    ctx: AppContext,
    id: String,
    scope: ViewScope,
    state: Mutex<ViewState<IssuePageData>>,
}

impl IssuePage {
    pub fn new(ctx: AppContext, id: impl Into<String>) -> Self {
        Self {
            ctx,
            id: id.into(),
            scope: ViewScope::new(),
            state: Mutex::new(ViewState::Loading),
        }
    }

    pub fn state(&self) -> ViewState<IssuePageData> {
        self.state.lock().clone()
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Fetch the issue, then its articles. Losing the article list is not
    /// fatal; the page renders with none.
    pub async fn load(&self) -> Result<(), ViewError> {
        let api = self.ctx.api.clone();
        let id = self.id.clone();
        let result = self
            .scope
            .run(async move {
                let issue = api.get_issue(&id).await?;
                let articles = match api.list_issue_articles(&id).await {
                    Ok(articles) => articles,
                    Err(e) => {
                        warn!(issue = %id, error = %e, "Could not load issue articles");
                        Vec::new()
                    }
                };
                Ok::<_, ViewError>((issue, articles))
            })
            .await;

        match result {
            Ok((issue, articles)) => {
                let articles = articles.into_iter().filter(Article::is_published).collect();
                *self.state.lock() = ViewState::Ready(IssuePageData { issue, articles });
                Ok(())
            }
            Err(ViewError::Cancelled) => Err(ViewError::Cancelled),
            Err(e) => {
                warn!(issue = %self.id, error = %e, "Issue page load failed");
                *self.state.lock() = ViewState::Failed(PAGE_FAILED.to_string());
                Err(e)
            }
        }
    }
}

/// Editable issue fields. Defaults to the current month and year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    pub title: String,
    pub description: String,
    pub month: u32,
    pub year: i32,
}

impl Default for IssueDraft {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            title: String::new(),
            description: String::new(),
            month: now.month(),
            year: now.year(),
        }
    }
}

impl IssueDraft {
    pub fn from_issue(issue: &Issue) -> Self {
        Self {
            title: issue.title.clone(),
            description: issue.description.clone(),
            month: issue.month,
            year: issue.year,
        }
    }

    pub fn to_input(&self) -> Result<IssueInput, ViewError> {
        let mut validator = Validator::new();
        validator.required("title", &self.title, "Title is required");
        if !(1..=12).contains(&self.month) {
            validator.add("month", "Month must be between 1 and 12");
        }
        if self.year <= 0 {
            validator.add("year", "Year is required");
        }
        validator.finish()?;

        Ok(IssueInput {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            month: self.month,
            year: self.year,
        })
    }
}

/// Create or edit an issue. Admin only.
pub struct IssueEditor {
    ctx: AppContext,
    id: Option<String>,
    scope: ViewScope,
    busy: BusyFlag,
    state: Mutex<ViewState<IssueDraft>>,
    error: Mutex<Option<String>>,
}

impl IssueEditor {
    /// Editor for a new issue; ready immediately with a default draft.
    pub fn create(ctx: AppContext) -> Self {
        Self::build(ctx, None, ViewState::Ready(IssueDraft::default()))
    }

    /// Editor for an existing issue; call [`load`](Self::load) first.
    pub fn edit(ctx: AppContext, id: impl Into<String>) -> Self {
        Self::build(ctx, Some(id.into()), ViewState::Loading)
    }

    fn build(ctx: AppContext, id: Option<String>, state: ViewState<IssueDraft>) -> Self {
        Self {
            ctx,
            id,
            scope: ViewScope::new(),
            busy: BusyFlag::default(),
            state: Mutex::new(state),
            error: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ViewState<IssueDraft> {
        self.state.lock().clone()
    }

    pub fn error(&self) -> Option<String> {
        self.error.lock().clone()
    }

    fn require_admin(&self) -> Result<(), ViewError> {
        let session = self.ctx.gate.session().ok_or(ViewError::NotAuthenticated)?;
        if !session.is_admin() {
            return Err(ViewError::Forbidden("Only admins can manage issues".to_string()));
        }
        Ok(())
    }

    /// Prefill the draft from the stored issue. A no-op for new issues.
    pub async fn load(&self) -> Result<(), ViewError> {
        self.require_admin()?;
        let id = match &self.id {
            Some(id) => id.clone(),
            None => return Ok(()),
        };

        let api = self.ctx.api.clone();
        let result = self
            .scope
            .run(async move { api.get_issue(&id).await.map_err(ViewError::from) })
            .await;

        match result {
            Ok(issue) => {
                *self.state.lock() = ViewState::Ready(IssueDraft::from_issue(&issue));
                Ok(())
            }
            Err(ViewError::Cancelled) => Err(ViewError::Cancelled),
            Err(e) => {
                *self.state.lock() = ViewState::Failed(PAGE_FAILED.to_string());
                Err(e)
            }
        }
    }

    /// Validate and save. Creates with POST, edits with PUT.
    pub async fn submit(&self, draft: &IssueDraft) -> Result<Route, ViewError> {
        let result = self.try_submit(draft).await;
        match &result {
            Ok(_) => *self.error.lock() = None,
            Err(ViewError::Cancelled) | Err(ViewError::Busy) => {}
            Err(e) => *self.error.lock() = Some(e.message_or(SAVE_FAILED)),
        }
        result
    }

    async fn try_submit(&self, draft: &IssueDraft) -> Result<Route, ViewError> {
        self.require_admin()?;
        let input = draft.to_input()?;

        let _busy = self.busy.try_acquire()?;
        let api = self.ctx.api.clone();
        let id = self.id.clone();
        let saved = self
            .scope
            .run(async move {
                let issue = match id {
                    Some(id) => api.update_issue(&id, &input).await?,
                    None => api.create_issue(&input).await?,
                };
                Ok::<_, ViewError>(issue)
            })
            .await?;

        info!(issue = %saved.id, title = %saved.title, "Issue saved");
        *self.state.lock() = ViewState::Ready(IssueDraft::from_issue(&saved));
        Ok(Route::Dashboard)
    }
}
