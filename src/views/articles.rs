//! Article screens.

use parking_lot::Mutex;
use tracing::{info, warn};

use super::form::{join_tags, parse_tags, slugify, Validator};
use super::{BusyFlag, ViewError, ViewScope, ViewState};
use crate::api::{Article, ArticleInput, ArticleStatus, ImageUpload, Issue};
use crate::auth::Route;
use crate::AppContext;

const LIST_FAILED: &str = "Failed to load articles";
const DETAIL_FAILED: &str = "Failed to load article";
const EDITOR_FAILED: &str = "Failed to load article data";
const ISSUES_FAILED: &str = "Failed to load issues";
const CREATE_FAILED: &str = "Failed to create article";
const UPDATE_FAILED: &str = "Failed to update article";

/// Article form fields as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleForm {
    pub title: String,
    /// Left blank to derive from the title.
    pub slug: String,
    pub content: String,
    /// Comma-separated.
    pub tags: String,
    pub issue_id: Option<String>,
    pub status: ArticleStatus,
}

impl ArticleForm {
    pub fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            slug: article.slug.clone(),
            content: article.content.clone(),
            tags: join_tags(&article.tags),
            issue_id: article.issue_id().map(str::to_string),
            status: article.status,
        }
    }

    /// The slug that will be sent: the typed one, or one derived from the title.
    pub fn effective_slug(&self) -> String {
        let typed = self.slug.trim();
        if typed.is_empty() {
            slugify(&self.title)
        } else {
            typed.to_string()
        }
    }

    /// Validate in display order and build the request body.
    pub fn to_input(&self) -> Result<ArticleInput, ViewError> {
        let slug = self.effective_slug();

        let mut validator = Validator::new();
        validator
            .required("title", &self.title, "Title is required")
            .required("content", &self.content, "Content is required")
            .required("slug", &slug, "Slug is required");
        validator.finish()?;

        Ok(ArticleInput {
            title: self.title.trim().to_string(),
            slug,
            content: self.content.trim().to_string(),
            tags: parse_tags(&self.tags),
            status: self.status,
            issue: self
                .issue_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        })
    }
}

/// Articles, optionally limited to one author.
pub struct ArticleList {
    ctx: AppContext,
    user_id: Option<String>,
    scope: ViewScope,
    state: Mutex<ViewState<Vec<Article>>>,
}

impl ArticleList {
    pub fn new(ctx: AppContext, user_id: Option<String>) -> Self {
        Self {
            ctx,
            user_id,
            scope: ViewScope::new(),
            state: Mutex::new(ViewState::Loading),
        }
    }

    pub fn state(&self) -> ViewState<Vec<Article>> {
        self.state.lock().clone()
    }

    /// The loaded articles that are visible to the public.
    pub fn published(&self) -> Vec<Article> {
        self.state
            .lock()
            .ready()
            .map(|articles| articles.iter().filter(|a| a.is_published()).cloned().collect())
            .unwrap_or_default()
    }

    pub async fn load(&self) -> Result<(), ViewError> {
        let api = self.ctx.api.clone();
        let user_id = self.user_id.clone();
        let result = self
            .scope
            .run(async move {
                api.list_articles(user_id.as_deref())
                    .await
                    .map_err(ViewError::from)
            })
            .await;

        match result {
            Ok(articles) => {
                *self.state.lock() = ViewState::Ready(articles);
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

/// Read-only view of a single article.
pub struct ArticleDetail {
    ctx: AppContext,
    id: String,
    scope: ViewScope,
    state: Mutex<ViewState<Article>>,
}

impl ArticleDetail {
    pub fn new(ctx: AppContext, id: impl Into<String>) -> Self {
        Self {
            ctx,
            id: id.into(),
            scope: ViewScope::new(),
            state: Mutex::new(ViewState::Loading),
        }
    }

    pub fn state(&self) -> ViewState<Article> {
        self.state.lock().clone()
    }

    pub async fn load(&self) -> Result<(), ViewError> {
        let api = self.ctx.api.clone();
        let id = self.id.clone();
        let result = self
            .scope
            .run(async move { api.get_article(&id).await.map_err(ViewError::from) })
            .await;

        match result {
            Ok(article) => {
                *self.state.lock() = ViewState::Ready(article);
                Ok(())
            }
            Err(ViewError::Cancelled) => Err(ViewError::Cancelled),
            Err(e) => {
                warn!(article = %self.id, error = %e, "Article load failed");
                *self.state.lock() = ViewState::Failed(DETAIL_FAILED.to_string());
                Err(e)
            }
        }
    }
}

/// Result of creating an article. The article exists even when the image
/// upload failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleCreated {
    pub article: Article,
    pub image_error: Option<String>,
}

/// New-article screen.
pub struct ArticleComposer {
    ctx: AppContext,
    scope: ViewScope,
    busy: BusyFlag,
    issues: Mutex<ViewState<Vec<Issue>>>,
    error: Mutex<Option<String>>,
}

impl ArticleComposer {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            scope: ViewScope::new(),
            busy: BusyFlag::default(),
            issues: Mutex::new(ViewState::Loading),
            error: Mutex::new(None),
        }
    }

    /// Issues offered in the issue selector.
    pub fn issues(&self) -> ViewState<Vec<Issue>> {
        self.issues.lock().clone()
    }

    pub fn error(&self) -> Option<String> {
        self.error.lock().clone()
    }

    pub async fn load(&self) -> Result<(), ViewError> {
        let api = self.ctx.api.clone();
        let result = self
            .scope
            .run(async move { api.list_issues().await.map_err(ViewError::from) })
            .await;

        match result {
            Ok(issues) => {
                *self.issues.lock() = ViewState::Ready(issues);
                Ok(())
            }
            Err(ViewError::Cancelled) => Err(ViewError::Cancelled),
            Err(e) => {
                *self.issues.lock() = ViewState::Failed(e.message_or(ISSUES_FAILED));
                Err(e)
            }
        }
    }

    /// Create the article, then attach `image` if one was chosen.
    pub async fn submit(
        &self,
        form: &ArticleForm,
        image: Option<ImageUpload>,
    ) -> Result<ArticleCreated, ViewError> {
        let result = self.try_submit(form, image).await;
        match &result {
            Ok(_) => *self.error.lock() = None,
            Err(ViewError::Cancelled) | Err(ViewError::Busy) => {}
            Err(e) => *self.error.lock() = Some(e.message_or(CREATE_FAILED)),
        }
        result
    }

    async fn try_submit(
        &self,
        form: &ArticleForm,
        image: Option<ImageUpload>,
    ) -> Result<ArticleCreated, ViewError> {
        let input = form.to_input()?;
        if self.ctx.gate.session().is_none() {
            return Err(ViewError::NotAuthenticated);
        }

        let _busy = self.busy.try_acquire()?;
        let api = self.ctx.api.clone();
        let created = self
            .scope
            .run(async move {
                let article = api.create_article(&input).await?;
                let image_error = match image {
                    Some(upload) => match api.upload_article_image(&article.id, upload).await {
                        Ok(_) => None,
                        Err(e) => {
                            warn!(article = %article.id, error = %e, "Image upload failed");
                            Some(e.message())
                        }
                    },
                    None => None,
                };
                Ok::<_, ViewError>(ArticleCreated {
                    article,
                    image_error,
                })
            })
            .await?;

        info!(article = %created.article.id, slug = %created.article.slug, "Article created");
        Ok(created)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleEditorData {
    pub article: Article,
    pub form: ArticleForm,
    pub issues: Vec<Issue>,
}

/// Edit-article screen.
pub struct ArticleEditor {
    ctx: AppContext,
    id: String,
    scope: ViewScope,
    busy: BusyFlag,
    state: Mutex<ViewState<ArticleEditorData>>,
    error: Mutex<Option<String>>,
}

impl ArticleEditor {
    pub fn new(ctx: AppContext, id: impl Into<String>) -> Self {
        Self {
            ctx,
            id: id.into(),
            scope: ViewScope::new(),
            busy: BusyFlag::default(),
            state: Mutex::new(ViewState::Loading),
            error: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ViewState<ArticleEditorData> {
        self.state.lock().clone()
    }

    pub fn error(&self) -> Option<String> {
        self.error.lock().clone()
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Fetch the article and the issue list together and prefill the form.
    pub async fn load(&self) -> Result<(), ViewError> {
        let api = self.ctx.api.clone();
        let id = self.id.clone();
        let result = self
            .scope
            .run(async move {
                let (article, issues) = tokio::try_join!(api.get_article(&id), api.list_issues())?;
                Ok::<_, ViewError>((article, issues))
            })
            .await;

        match result {
            Ok((article, issues)) => {
                let form = ArticleForm::from_article(&article);
                *self.state.lock() = ViewState::Ready(ArticleEditorData {
                    article,
                    form,
                    issues,
                });
                Ok(())
            }
            Err(ViewError::Cancelled) => Err(ViewError::Cancelled),
            Err(e) => {
                warn!(article = %self.id, error = %e, "Article editor load failed");
                *self.state.lock() = ViewState::Failed(EDITOR_FAILED.to_string());
                Err(e)
            }
        }
    }

    /// Replace the article with the form's contents.
    pub async fn submit(&self, form: &ArticleForm) -> Result<Route, ViewError> {
        let result = self.try_submit(form).await;
        match &result {
            Ok(_) => *self.error.lock() = None,
            Err(ViewError::Cancelled) | Err(ViewError::Busy) => {}
            Err(e) => *self.error.lock() = Some(e.message_or(UPDATE_FAILED)),
        }
        result
    }

    async fn try_submit(&self, form: &ArticleForm) -> Result<Route, ViewError> {
        let input = form.to_input()?;

        let _busy = self.busy.try_acquire()?;
        let api = self.ctx.api.clone();
        let id = self.id.clone();
        let updated = self
            .scope
            .run(async move { api.update_article(&id, &input).await.map_err(ViewError::from) })
            .await?;

        info!(article = %updated.id, "Article updated");
        if let ViewState::Ready(data) = &mut *self.state.lock() {
            data.form = ArticleForm::from_article(&updated);
            data.article = updated;
        }
        Ok(Route::Dashboard)
    }
}
