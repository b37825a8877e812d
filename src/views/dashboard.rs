//! Role-aware dashboard: the signed-in user's articles plus all issues.

use parking_lot::Mutex;
use tracing::{info, warn};

use super::{BusyFlag, Confirm, ViewError, ViewScope, ViewState};
use crate::api::{Article, ArticlePatch, ArticleStatus, Issue};
use crate::session::Session;
use crate::AppContext;

const LOAD_FAILED: &str = "Unable to load dashboard data. Please try again.";
const DELETE_ARTICLE_FAILED: &str = "Failed to delete article";
const DELETE_ISSUE_FAILED: &str = "Failed to delete issue";
const STATUS_FAILED: &str = "Failed to update article status";

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub session: Session,
    pub articles: Vec<Article>,
    pub issues: Vec<Issue>,
}

/// Admin summary counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Analytics {
    pub total_articles: usize,
    pub published: usize,
    pub drafts: usize,
    pub issues: usize,
}

impl DashboardData {
    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    /// Admins and the article's author may edit or delete it.
    pub fn can_edit(&self, article: &Article) -> bool {
        self.is_admin() || article.author == self.session.user.username
    }

    /// Publishing is an admin decision.
    pub fn can_change_status(&self) -> bool {
        self.is_admin()
    }

    pub fn can_manage_issues(&self) -> bool {
        self.is_admin()
    }

    pub fn analytics(&self) -> Option<Analytics> {
        if !self.is_admin() {
            return None;
        }
        let published = self.articles.iter().filter(|a| a.is_published()).count();
        Some(Analytics {
            total_articles: self.articles.len(),
            published,
            drafts: self.articles.len() - published,
            issues: self.issues.len(),
        })
    }
}

pub struct Dashboard {
    ctx: AppContext,
    scope: ViewScope,
    busy: BusyFlag,
    state: Mutex<ViewState<DashboardData>>,
    error: Mutex<Option<String>>,
}

impl Dashboard {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            scope: ViewScope::new(),
            busy: BusyFlag::default(),
            state: Mutex::new(ViewState::Loading),
            error: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ViewState<DashboardData> {
        self.state.lock().clone()
    }

    /// Inline error from the last failed action.
    pub fn error(&self) -> Option<String> {
        self.error.lock().clone()
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    fn set_error(&self, message: impl Into<String>) {
        *self.error.lock() = Some(message.into());
    }

    fn data(&self) -> Result<DashboardData, ViewError> {
        self.state
            .lock()
            .ready()
            .cloned()
            .ok_or_else(|| ViewError::Validation("Dashboard is not loaded".to_string()))
    }

    /// Fetch articles and issues together. Writers only see their own
    /// articles; the scoping is done by the server via `userId`.
    pub async fn load(&self) -> Result<(), ViewError> {
        let session = self.ctx.gate.session().ok_or(ViewError::NotAuthenticated)?;
        let author_filter = if session.is_admin() {
            None
        } else {
            Some(session.user.id.clone())
        };

        let api = self.ctx.api.clone();
        let fetched = self
            .scope
            .run(async move {
                let (articles, issues) = tokio::try_join!(
                    api.list_articles(author_filter.as_deref()),
                    api.list_issues()
                )?;
                Ok::<_, ViewError>((articles, issues))
            })
            .await;

        match fetched {
            Ok((articles, issues)) => {
                info!(
                    articles = articles.len(),
                    issues = issues.len(),
                    "Dashboard loaded"
                );
                *self.state.lock() = ViewState::Ready(DashboardData {
                    session,
                    articles,
                    issues,
                });
                *self.error.lock() = None;
                Ok(())
            }
            Err(ViewError::Cancelled) => Err(ViewError::Cancelled),
            Err(e) => {
                warn!(error = %e, "Dashboard load failed");
                *self.state.lock() = ViewState::Failed(LOAD_FAILED.to_string());
                Err(e)
            }
        }
    }

    /// Delete an article after confirmation. Returns `Ok(false)` when the
    /// user declines. The local list only changes on success.
    pub async fn delete_article(&self, id: &str, confirm: &dyn Confirm) -> Result<bool, ViewError> {
        let data = self.data()?;
        let article = data
            .articles
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| ViewError::Validation(format!("Article {} is not on the dashboard", id)))?;
        if !data.can_edit(article) {
            return Err(ViewError::Forbidden(
                "You can only delete your own articles".to_string(),
            ));
        }
        if !confirm.confirm("Are you sure you want to delete this article?") {
            return Ok(false);
        }

        let _busy = self.busy.try_acquire()?;
        let api = self.ctx.api.clone();
        let target = id.to_string();
        let result = self
            .scope
            .run(async move { api.delete_article(&target).await.map_err(ViewError::from) })
            .await;

        match result {
            Ok(_) => {
                if let ViewState::Ready(data) = &mut *self.state.lock() {
                    data.articles.retain(|a| a.id != id);
                }
                info!(article = id, "Article deleted");
                Ok(true)
            }
            Err(ViewError::Cancelled) => Err(ViewError::Cancelled),
            Err(e) => {
                self.set_error(DELETE_ARTICLE_FAILED);
                Err(e)
            }
        }
    }

    /// Flip an article between draft and published. Admin only.
    pub async fn toggle_status(&self, id: &str) -> Result<ArticleStatus, ViewError> {
        let data = self.data()?;
        if !data.can_change_status() {
            return Err(ViewError::Forbidden(
                "Only admins can publish or unpublish articles".to_string(),
            ));
        }
        let current = data
            .articles
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.status)
            .ok_or_else(|| ViewError::Validation(format!("Article {} is not on the dashboard", id)))?;
        let next = current.toggled();

        let _busy = self.busy.try_acquire()?;
        let api = self.ctx.api.clone();
        let target = id.to_string();
        let result = self
            .scope
            .run(async move {
                api.patch_article(&target, &ArticlePatch::status(next))
                    .await
                    .map_err(ViewError::from)
            })
            .await;

        match result {
            Ok(_) => {
                if let ViewState::Ready(data) = &mut *self.state.lock() {
                    if let Some(article) = data.articles.iter_mut().find(|a| a.id == id) {
                        article.status = next;
                    }
                }
                info!(article = id, status = %next, "Article status changed");
                Ok(next)
            }
            Err(ViewError::Cancelled) => Err(ViewError::Cancelled),
            Err(e) => {
                self.set_error(STATUS_FAILED);
                Err(e)
            }
        }
    }

    /// Delete an issue after confirmation. Admin only.
    pub async fn delete_issue(&self, id: &str, confirm: &dyn Confirm) -> Result<bool, ViewError> {
        let data = self.data()?;
        if !data.can_manage_issues() {
            return Err(ViewError::Forbidden(
                "Only admins can delete issues".to_string(),
            ));
        }
        if !confirm.confirm("Are you sure you want to delete this issue?") {
            return Ok(false);
        }

        let _busy = self.busy.try_acquire()?;
        let api = self.ctx.api.clone();
        let target = id.to_string();
        let result = self
            .scope
            .run(async move { api.delete_issue(&target).await.map_err(ViewError::from) })
            .await;

        match result {
            Ok(_) => {
                if let ViewState::Ready(data) = &mut *self.state.lock() {
                    data.issues.retain(|i| i.id != id);
                }
                info!(issue = id, "Issue deleted");
                Ok(true)
            }
            Err(ViewError::Cancelled) => Err(ViewError::Cancelled),
            Err(e) => {
                self.set_error(DELETE_ISSUE_FAILED);
                Err(e)
            }
        }
    }
}
