use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use magcms::cli::{run_command, Cli, Commands};
use magcms::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration. `config check` reports problems itself.
    let config = match &cli.command {
        Commands::Config(_) => Config::default(),
        _ => Config::load(&cli.config)?,
    };

    // Initialize logging. Output goes to stderr so tables stay pipeable.
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("magcms v{}", env!("CARGO_PKG_VERSION"));

    run_command(&cli, config).await
}
