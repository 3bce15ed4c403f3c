use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newswatch_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "newswatch")]
#[command(author, version, about = "Keyword alerts over news feeds")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the configuration file
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Server address for `status` and `trigger` (defaults to server.bind)
    #[arg(long = "url", global = true)]
    url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the periodic scanner and the HTTP trigger server
    Serve,
    /// Run a single scan and print the report
    Scan {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the status of a running server
    Status,
    /// Ask a running server to scan now
    Trigger,
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(AppConfig::config_path);

    // Load configuration; `config init` must still work on a broken file
    let loaded = AppConfig::load_from(&config_path);

    // Initialize logging
    let default_level = loaded
        .as_ref()
        .map(|c| c.general.log_level.clone())
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or(default_level),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Some(Commands::Config { action }) = &cli.command {
        return match action {
            ConfigAction::Init { force } => commands::config::init(&config_path, *force),
            ConfigAction::Path => commands::config::path(&config_path),
            ConfigAction::Show => commands::config::show(&loaded?),
        };
    }

    let config = loaded?;
    let server_url = cli
        .url
        .unwrap_or_else(|| commands::server_url(&config.server.bind));

    match cli.command {
        Some(Commands::Serve) | None => commands::serve::run(config_path, &config).await,
        Some(Commands::Scan { json }) => commands::scan::run(config_path, json).await,
        Some(Commands::Status) => commands::status::run(&server_url).await,
        Some(Commands::Trigger) => commands::trigger::run(&server_url).await,
        Some(Commands::Config { .. }) => Ok(()),
    }
}
