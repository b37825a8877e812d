//! Navigable screens.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
    Dashboard,
    NewIssue,
    EditIssue(String),
    NewArticle,
    EditArticle(String),
    Article(String),
    Issue(String),
}

impl Route {
    /// Screens that render only for an authenticated session.
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Route::Dashboard
                | Route::NewIssue
                | Route::EditIssue(_)
                | Route::NewArticle
                | Route::EditArticle(_)
        )
    }

    /// Parse a URL path such as `/articles/abc/edit`.
    pub fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path
            .split('?')
            .next()
            .unwrap_or_default()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let route = match segments.as_slice() {
            [] => Route::Home,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["dashboard"] => Route::Dashboard,
            ["issues", "new"] => Route::NewIssue,
            ["issues", id, "edit"] => Route::EditIssue(id.to_string()),
            ["issues", id] => Route::Issue(id.to_string()),
            ["articles", "new"] => Route::NewArticle,
            ["articles", id, "edit"] => Route::EditArticle(id.to_string()),
            ["articles", id] => Route::Article(id.to_string()),
            _ => return None,
        };
        Some(route)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::Register => write!(f, "/register"),
            Route::Dashboard => write!(f, "/dashboard"),
            Route::NewIssue => write!(f, "/issues/new"),
            Route::EditIssue(id) => write!(f, "/issues/{}/edit", id),
            Route::NewArticle => write!(f, "/articles/new"),
            Route::EditArticle(id) => write!(f, "/articles/{}/edit", id),
            Route::Article(id) => write!(f, "/articles/{}", id),
            Route::Issue(id) => write!(f, "/issues/{}", id),
        }
    }
}

/// Outcome of evaluating a route against the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    Redirect(Route),
}
