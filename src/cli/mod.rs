//! CLI module for the magcms command-line client.
//!
//! Every command goes through the same views a graphical front-end would
//! use, so validation, permissions and error messages are identical:
//! - `login` / `register` / `logout` / `whoami` - session management
//! - `dashboard` - role-aware overview
//! - `issues ...` and `articles ...` - content management
//! - `config check` - validate configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::api::models::month_name;
use crate::api::{Article, ArticleStatus, ImageUpload, Issue};
use crate::auth::{AuthState, LogoutReason, Route, RouteDecision};
use crate::config::Config;
use crate::session::Role;
use crate::views::form::parse_tags;
use crate::views::{
    ArticleComposer, ArticleDetail, ArticleEditor, ArticleForm, ArticleList, Confirm, Dashboard,
    IssueDraft, IssueEditor, IssueList, IssuePage, LoginForm, RegisterForm, ViewError,
};
use crate::AppContext;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "magcms")]
#[command(author, version, about = "Command-line client for the magazine CMS", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "magcms.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// CMS server URL (overrides api.base_url)
    #[arg(long, env = "MAGCMS_API_URL")]
    pub api_url: Option<String>,

    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session token
    Login {
        username: String,
        /// Password (prompted for when omitted)
        #[arg(long, env = "MAGCMS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create a new account
    Register {
        username: String,
        #[arg(long, env = "MAGCMS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Account role (default: writer)
        #[arg(long)]
        role: Option<Role>,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show the dashboard for the signed-in user
    Dashboard,

    /// Issue management commands
    #[command(subcommand)]
    Issues(IssuesCommands),

    /// Article management commands
    #[command(subcommand)]
    Articles(ArticlesCommands),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Issues subcommands
#[derive(Subcommand, Debug)]
pub enum IssuesCommands {
    /// List all issues
    List,
    /// Show an issue and its published articles
    Show { id: String },
    /// Create an issue (admin)
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Month 1-12 (default: current month)
        #[arg(long)]
        month: Option<u32>,
        /// Year (default: current year)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Edit an issue (admin)
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Delete an issue (admin)
    Delete { id: String },
}

/// Articles subcommands
#[derive(Subcommand, Debug)]
pub enum ArticlesCommands {
    /// List articles
    List {
        /// Only articles written by this user id
        #[arg(long)]
        user: Option<String>,
        /// Only published articles
        #[arg(long)]
        published: bool,
    },
    /// Show a single article
    Show { id: String },
    /// Create an article
    Create {
        #[arg(long)]
        title: String,
        /// Article body
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,
        /// Read the article body from a file
        #[arg(long)]
        content_file: Option<PathBuf>,
        /// URL slug (derived from the title when omitted)
        #[arg(long)]
        slug: Option<String>,
        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
        /// Issue id to file the article under
        #[arg(long)]
        issue: Option<String>,
        /// Publish immediately instead of saving a draft
        #[arg(long)]
        publish: bool,
        /// Cover image to upload after creation
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Edit an article
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,
        #[arg(long)]
        content_file: Option<PathBuf>,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        issue: Option<String>,
        #[arg(long)]
        status: Option<ArticleStatus>,
    },
    /// Delete an article
    Delete { id: String },
    /// Publish a draft (admin)
    Publish { id: String },
    /// Move a published article back to draft (admin)
    Unpublish { id: String },
    /// Upload a cover image for an article
    Image { id: String, path: PathBuf },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

// ============================================================================
// CLI Command Handlers
// ============================================================================

/// Run a CLI command
pub async fn run_command(cli: &Cli, mut config: Config) -> Result<()> {
    if let Commands::Config(ConfigCommands::Check) = &cli.command {
        return cmd_config_check(cli);
    }

    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    let ctx = AppContext::from_config(&config)?;

    match &cli.command {
        Commands::Login { username, password } => {
            cmd_login(&ctx, username, password.as_deref()).await
        }
        Commands::Register {
            username,
            password,
            role,
        } => cmd_register(&ctx, username, password.as_deref(), *role).await,
        Commands::Logout => cmd_logout(&ctx),
        Commands::Whoami => cmd_whoami(&ctx),
        Commands::Dashboard => cmd_dashboard(&ctx).await,
        Commands::Issues(command) => run_issues(cli, &ctx, command).await,
        Commands::Articles(command) => run_articles(cli, &ctx, command).await,
        Commands::Config(_) => Ok(()),
    }
}

async fn run_issues(cli: &Cli, ctx: &AppContext, command: &IssuesCommands) -> Result<()> {
    match command {
        IssuesCommands::List => cmd_issues_list(ctx).await,
        IssuesCommands::Show { id } => cmd_issues_show(ctx, id).await,
        IssuesCommands::Create {
            title,
            description,
            month,
            year,
        } => {
            require_route(ctx, Route::NewIssue)?;
            let mut draft = IssueDraft {
                title: title.clone(),
                description: description.clone(),
                ..IssueDraft::default()
            };
            if let Some(month) = month {
                draft.month = *month;
            }
            if let Some(year) = year {
                draft.year = *year;
            }
            let editor = IssueEditor::create(ctx.clone());
            editor
                .submit(&draft)
                .await
                .map_err(|e| view_failure(e, editor.error()))?;
            println!("Issue created: {} ({} {})", draft.title.trim(), month_name(draft.month), draft.year);
            Ok(())
        }
        IssuesCommands::Edit {
            id,
            title,
            description,
            month,
            year,
        } => {
            require_route(ctx, Route::EditIssue(id.clone()))?;
            let editor = IssueEditor::edit(ctx.clone(), id.clone());
            editor.load().await.map_err(|e| view_failure(e, editor.state().error().map(str::to_string)))?;
            let mut draft = editor
                .state()
                .ready()
                .cloned()
                .context("Issue could not be loaded")?;
            if let Some(title) = title {
                draft.title = title.clone();
            }
            if let Some(description) = description {
                draft.description = description.clone();
            }
            if let Some(month) = month {
                draft.month = *month;
            }
            if let Some(year) = year {
                draft.year = *year;
            }
            editor
                .submit(&draft)
                .await
                .map_err(|e| view_failure(e, editor.error()))?;
            println!("Issue {} updated.", id);
            Ok(())
        }
        IssuesCommands::Delete { id } => {
            let dashboard = load_dashboard(ctx).await?;
            let deleted = dashboard
                .delete_issue(id, &prompt_for(cli))
                .await
                .map_err(|e| view_failure(e, dashboard.error()))?;
            if deleted {
                println!("Issue {} deleted.", id);
            } else {
                println!("Cancelled.");
            }
            Ok(())
        }
    }
}

async fn run_articles(cli: &Cli, ctx: &AppContext, command: &ArticlesCommands) -> Result<()> {
    match command {
        ArticlesCommands::List { user, published } => {
            let list = ArticleList::new(ctx.clone(), user.clone());
            list.load()
                .await
                .map_err(|e| view_failure(e, list.state().error().map(str::to_string)))?;
            let articles = if *published {
                list.published()
            } else {
                list.state().ready().cloned().unwrap_or_default()
            };
            print_articles(&articles, None);
            Ok(())
        }
        ArticlesCommands::Show { id } => cmd_articles_show(ctx, id).await,
        ArticlesCommands::Create {
            title,
            content,
            content_file,
            slug,
            tags,
            issue,
            publish,
            image,
        } => {
            require_route(ctx, Route::NewArticle)?;
            let form = ArticleForm {
                title: title.clone(),
                slug: slug.clone().unwrap_or_default(),
                content: read_content(content.as_deref(), content_file.as_ref())?.unwrap_or_default(),
                tags: tags.clone(),
                issue_id: issue.clone(),
                status: if *publish {
                    ArticleStatus::Published
                } else {
                    ArticleStatus::Draft
                },
            };
            let upload = match image {
                Some(path) => Some(
                    ImageUpload::from_path(path)
                        .with_context(|| format!("Failed to read image: {}", path.display()))?,
                ),
                None => None,
            };

            let composer = ArticleComposer::new(ctx.clone());
            let created = composer
                .submit(&form, upload)
                .await
                .map_err(|e| view_failure(e, composer.error()))?;
            println!(
                "Article created: {} (/{}, {})",
                created.article.id, created.article.slug, created.article.status
            );
            if let Some(error) = created.image_error {
                println!("[!] Image upload failed: {}", error);
            }
            Ok(())
        }
        ArticlesCommands::Edit {
            id,
            title,
            content,
            content_file,
            slug,
            tags,
            issue,
            status,
        } => {
            require_route(ctx, Route::EditArticle(id.clone()))?;
            let editor = ArticleEditor::new(ctx.clone(), id.clone());
            editor.load().await.map_err(|e| view_failure(e, editor.state().error().map(str::to_string)))?;
            let mut form = editor
                .state()
                .ready()
                .map(|data| data.form.clone())
                .context("Article could not be loaded")?;

            if let Some(title) = title {
                form.title = title.clone();
            }
            if let Some(content) = read_content(content.as_deref(), content_file.as_ref())? {
                form.content = content;
            }
            if let Some(slug) = slug {
                form.slug = slug.clone();
            }
            if let Some(tags) = tags {
                form.tags = parse_tags(tags).join(", ");
            }
            if let Some(issue) = issue {
                form.issue_id = Some(issue.clone());
            }
            if let Some(status) = status {
                form.status = *status;
            }

            editor
                .submit(&form)
                .await
                .map_err(|e| view_failure(e, editor.error()))?;
            println!("Article {} updated.", id);
            Ok(())
        }
        ArticlesCommands::Delete { id } => {
            let dashboard = load_dashboard(ctx).await?;
            let deleted = dashboard
                .delete_article(id, &prompt_for(cli))
                .await
                .map_err(|e| view_failure(e, dashboard.error()))?;
            if deleted {
                println!("Article {} deleted.", id);
            } else {
                println!("Cancelled.");
            }
            Ok(())
        }
        ArticlesCommands::Publish { id } => set_status(ctx, id, ArticleStatus::Published).await,
        ArticlesCommands::Unpublish { id } => set_status(ctx, id, ArticleStatus::Draft).await,
        ArticlesCommands::Image { id, path } => {
            require_route(ctx, Route::EditArticle(id.clone()))?;
            let upload = ImageUpload::from_path(path)
                .with_context(|| format!("Failed to read image: {}", path.display()))?;
            ctx.api
                .upload_article_image(id, upload)
                .await
                .map_err(|e| view_failure(ViewError::from(e), None))?;
            println!("Image uploaded for article {}.", id);
            Ok(())
        }
    }
}

async fn cmd_login(ctx: &AppContext, username: &str, password: Option<&str>) -> Result<()> {
    let password = match password {
        Some(password) => password.to_string(),
        None => prompt_line("Password: ")?,
    };
    let form = LoginForm::new(ctx.clone());
    form.submit(username, &password)
        .await
        .map_err(|e| anyhow::anyhow!(form.error().unwrap_or_else(|| e.to_string())))?;

    if let Some(session) = ctx.gate.session() {
        println!("Logged in as {} ({}).", session.user.username, session.user.role);
    }
    Ok(())
}

async fn cmd_register(
    ctx: &AppContext,
    username: &str,
    password: Option<&str>,
    role: Option<Role>,
) -> Result<()> {
    let password = match password {
        Some(password) => password.to_string(),
        None => prompt_line("Password: ")?,
    };
    let form = RegisterForm::new(ctx.clone());
    form.submit(username, &password, role)
        .await
        .map_err(|e| anyhow::anyhow!(form.error().unwrap_or_else(|| e.to_string())))?;
    println!("Account created. Run `magcms login {}` to sign in.", username);
    Ok(())
}

fn cmd_logout(ctx: &AppContext) -> Result<()> {
    ctx.gate.logout(LogoutReason::UserRequested);
    println!("Logged out.");
    Ok(())
}

fn cmd_whoami(ctx: &AppContext) -> Result<()> {
    match ctx.gate.state() {
        AuthState::Authenticated(session) => {
            println!("User:     {}", session.user.username);
            println!("ID:       {}", session.user.id);
            println!("Role:     {}", session.user.role);
            println!("Expires:  {}", session.expires_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        AuthState::Anonymous { reason } => {
            match reason {
                Some(reason) => println!("Not logged in ({}).", reason),
                None => println!("Not logged in."),
            }
        }
    }
    Ok(())
}

async fn cmd_dashboard(ctx: &AppContext) -> Result<()> {
    let dashboard = load_dashboard(ctx).await?;
    let data = dashboard
        .state()
        .ready()
        .cloned()
        .context("Dashboard is not loaded")?;

    println!();
    println!(
        "=== Dashboard: {} ({}) ===",
        data.session.user.username, data.session.user.role
    );

    if let Some(stats) = data.analytics() {
        println!();
        println!("Analytics:");
        println!("  Articles:   {}", stats.total_articles);
        println!("  Published:  {}", stats.published);
        println!("  Drafts:     {}", stats.drafts);
        println!("  Issues:     {}", stats.issues);
    }

    println!();
    println!("Articles:");
    print_articles(&data.articles, Some(&|a: &Article| data.can_edit(a)));

    println!();
    println!("Issues:");
    print_issues(&data.issues);
    println!();
    Ok(())
}

async fn cmd_issues_list(ctx: &AppContext) -> Result<()> {
    let list = IssueList::new(ctx.clone());
    list.load()
        .await
        .map_err(|e| view_failure(e, list.state().error().map(str::to_string)))?;
    print_issues(list.state().ready().map(Vec::as_slice).unwrap_or_default());
    Ok(())
}

async fn cmd_issues_show(ctx: &AppContext, id: &str) -> Result<()> {
    let page = IssuePage::new(ctx.clone(), id);
    page.load()
        .await
        .map_err(|e| view_failure(e, page.state().error().map(str::to_string)))?;
    let data = page.state().ready().cloned().context("Issue is not loaded")?;

    println!();
    println!("=== {} ===", data.issue.title);
    println!("Edition:   {}", data.issue.edition_label());
    if let Some(published) = data.issue.publish_date {
        println!("Published: {}", published.format("%Y-%m-%d"));
    }
    if !data.issue.description.is_empty() {
        println!();
        println!("{}", data.issue.description);
    }
    println!();
    print_articles(&data.articles, None);
    Ok(())
}

async fn cmd_articles_show(ctx: &AppContext, id: &str) -> Result<()> {
    let detail = ArticleDetail::new(ctx.clone(), id);
    detail
        .load()
        .await
        .map_err(|e| view_failure(e, detail.state().error().map(str::to_string)))?;
    let article = detail.state().ready().cloned().context("Article is not loaded")?;

    println!();
    println!("=== {} ===", article.title);
    println!("Slug:     {}", article.slug);
    println!("Status:   {}", article.status);
    println!("Author:   {}", display_or_dash(&article.author));
    if let Some(issue) = &article.issue {
        println!("Issue:    {}", issue.title().unwrap_or(issue.id()));
    }
    if !article.tags.is_empty() {
        println!("Tags:     {}", article.tags.join(", "));
    }
    if let Some(created) = article.created_at {
        println!("Created:  {}", created.format("%Y-%m-%d %H:%M"));
    }
    if let Some(image) = &article.image {
        println!("Image:    {}", image);
    }
    println!();
    println!("{}", article.content);
    Ok(())
}

async fn set_status(ctx: &AppContext, id: &str, target: ArticleStatus) -> Result<()> {
    let dashboard = load_dashboard(ctx).await?;
    let current = dashboard
        .state()
        .ready()
        .and_then(|data| data.articles.iter().find(|a| a.id == id).map(|a| a.status))
        .with_context(|| format!("Article {} is not on your dashboard", id))?;

    if current == target {
        println!("Article {} is already {}.", id, target);
        return Ok(());
    }
    let status = dashboard
        .toggle_status(id)
        .await
        .map_err(|e| view_failure(e, dashboard.error()))?;
    println!("Article {} is now {}.", id, status);
    Ok(())
}

/// Validate configuration file
fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("Built-in defaults will be used.");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(config) => {
            println!("[OK] Configuration file is valid!");
            println!();
            println!("API:");
            println!("  Base URL:     {}", config.api.base_url);
            println!("  Timeout:      {}s", config.api.timeout_secs);
            println!();
            println!("Session:");
            println!("  Data Dir:     {}", config.session.data_dir.display());
            println!();
            println!("Logging:");
            println!("  Level:        {}", config.logging.level);
            println!();
            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            println!();
            anyhow::bail!("Invalid configuration file");
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Fail early with a login hint when `route` is not available to the
/// current session.
fn require_route(ctx: &AppContext, route: Route) -> Result<()> {
    match ctx.gate.guard(&route) {
        RouteDecision::Render(_) => Ok(()),
        RouteDecision::Redirect(_) => {
            anyhow::bail!("Not logged in. Run `magcms login <username>` first.")
        }
    }
}

async fn load_dashboard(ctx: &AppContext) -> Result<Dashboard> {
    require_route(ctx, Route::Dashboard)?;
    let dashboard = Dashboard::new(ctx.clone());
    dashboard
        .load()
        .await
        .map_err(|e| view_failure(e, dashboard.state().error().map(str::to_string)))?;
    Ok(dashboard)
}

/// Turn a view error into a CLI error, preferring the message the view
/// chose to show.
fn view_failure(err: ViewError, shown: Option<String>) -> anyhow::Error {
    if err.redirect() == Some(Route::Login) {
        return anyhow::anyhow!("{} Run `magcms login <username>` to sign in again.", err);
    }
    match shown {
        Some(message) if message != err.to_string() => anyhow::anyhow!("{}: {}", message, err),
        Some(message) => anyhow::anyhow!(message),
        None => anyhow::anyhow!(err),
    }
}

fn read_content(inline: Option<&str>, file: Option<&PathBuf>) -> Result<Option<String>> {
    match (inline, file) {
        (Some(text), _) => Ok(Some(text.to_string())),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("Failed to read content file: {}", path.display())),
        (None, None) => Ok(None),
    }
}

/// Confirmation source for destructive commands.
fn prompt_for(cli: &Cli) -> impl Confirm {
    let assume_yes = cli.yes;
    move |prompt: &str| assume_yes || ask_yes_no(prompt)
}

fn ask_yes_no(prompt: &str) -> bool {
    match prompt_line(&format!("{} [y/N] ", prompt)) {
        Ok(answer) => is_yes(&answer),
        Err(_) => false,
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush().context("Failed to write prompt")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_issues(issues: &[Issue]) {
    if issues.is_empty() {
        println!("No issues found.");
        return;
    }

    println!(
        "{:<26}  {:<30}  {:<16}  {:<8}",
        "ID", "TITLE", "EDITION", "ARTICLES"
    );
    println!("{}", "-".repeat(86));
    for issue in issues {
        println!(
            "{:<26}  {:<30}  {:<16}  {:<8}",
            issue.id,
            truncate(&issue.title, 30),
            issue.edition_label(),
            issue.articles.len()
        );
    }
}

fn print_articles(articles: &[Article], editable: Option<&dyn Fn(&Article) -> bool>) {
    if articles.is_empty() {
        println!("No articles found.");
        return;
    }

    println!(
        "{:<26}  {:<30}  {:<10}  {:<14}  {:<20}",
        "ID", "TITLE", "STATUS", "AUTHOR", "ISSUE"
    );
    println!("{}", "-".repeat(108));
    for article in articles {
        let issue = article
            .issue
            .as_ref()
            .map(|i| i.title().unwrap_or(i.id()).to_string())
            .unwrap_or_else(|| "-".to_string());
        let marker = match editable {
            Some(can_edit) if can_edit(article) => " *",
            _ => "",
        };
        println!(
            "{:<26}  {:<30}  {:<10}  {:<14}  {:<20}{}",
            article.id,
            truncate(&article.title, 30),
            article.status.to_string(),
            truncate(display_or_dash(&article.author), 14),
            truncate(&issue, 20),
            marker
        );
    }
    if editable.is_some() {
        println!();
        println!("* you can edit or delete this article");
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

/// Truncate a string to max length with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 10), "a much ...");
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES \n"));
        assert!(!is_yes(""));
        assert!(!is_yes("nope"));
    }

    #[test]
    fn test_parse_article_commands() {
        let cli = Cli::try_parse_from([
            "magcms",
            "articles",
            "create",
            "--title",
            "Hello",
            "--content",
            "Body",
            "--tags",
            "a, b",
            "--publish",
        ])
        .unwrap();
        match cli.command {
            Commands::Articles(ArticlesCommands::Create {
                title,
                content,
                publish,
                slug,
                ..
            }) => {
                assert_eq!(title, "Hello");
                assert_eq!(content.as_deref(), Some("Body"));
                assert!(publish);
                assert_eq!(slug, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.config, PathBuf::from("magcms.toml"));
    }

    #[test]
    fn test_parse_global_yes_and_status() {
        let cli = Cli::try_parse_from(["magcms", "articles", "delete", "a1", "--yes"]).unwrap();
        assert!(cli.yes);

        let cli =
            Cli::try_parse_from(["magcms", "articles", "edit", "a1", "--status", "published"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Articles(ArticlesCommands::Edit {
                status: Some(ArticleStatus::Published),
                ..
            })
        ));
    }

    #[test]
    fn test_register_role_parses() {
        let cli = Cli::try_parse_from(["magcms", "register", "carol", "--role", "admin"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Register {
                role: Some(Role::Admin),
                ..
            }
        ));
    }

    #[test]
    fn test_prompt_for_assumes_yes_with_flag() {
        let cli = Cli::try_parse_from(["magcms", "--yes", "issues", "delete", "i1"]).unwrap();
        assert!(prompt_for(&cli).confirm("Delete?"));
    }

    #[test]
    fn test_view_failure_messages() {
        let err = view_failure(
            ViewError::Validation("Title is required".into()),
            Some("Title is required".into()),
        );
        assert_eq!(err.to_string(), "Title is required");

        let err = view_failure(ViewError::NotAuthenticated, None);
        assert!(err.to_string().contains("magcms login"));
    }
}
