//! Archive command-line client - composition root.
//!
//! 1. Parse arguments and load configuration from TOML
//! 2. Initialize tracing (RUST_LOG > --log-level > config)
//! 3. Build the HTTP client for the backend
//! 4. Run the requested command: interactive chat, one-shot ask, session,
//!    contract and search commands

mod chat;
mod cli;
mod commands;
mod error;
mod render;

use std::sync::Arc;

use archive_client::HttpClient;
use archive_core::ArchiveConfig;
use clap::Parser;

use crate::cli::{CliArgs, Command};
use crate::error::AppError;

async fn run(command: Command, client: HttpClient, config: ArchiveConfig) -> Result<(), AppError> {
    match command {
        Command::Chat => chat::run(Arc::new(client), config.chat).await,
        Command::Ask { question, session } => {
            commands::ask(&client, &config, &question, session).await
        }
        Command::Sessions(cmd) => commands::sessions(&client, &config, cmd).await,
        Command::Contracts(cmd) => commands::contracts(&client, &config, cmd).await,
        Command::Search(cmd) => commands::search(&client, cmd).await,
        Command::Health => commands::health(&client).await,
    }
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = match args.load_config(&config_file) {
        Ok(config) => (config, None),
        Err(e) => (ArchiveConfig::default(), Some(e)),
    };
    config.api.base_url = args.resolve_base_url(&config.api.base_url);

    // Tracing. Logs go to stderr so they never mix with command output.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = load_error {
        tracing::error!(path = %config_file.display(), error = %e, "Config load failed");
        eprintln!("{}: {}", config_file.display(), e.user_message());
        std::process::exit(2);
    }

    tracing::debug!(
        path = %config_file.display(),
        base_url = %config.api.base_url,
        "Configuration loaded"
    );

    let client = match HttpClient::new(&config.api) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(base_url = %config.api.base_url, error = %e, "Invalid API configuration");
            eprintln!("{}", e.user_message());
            std::process::exit(2);
        }
    };

    if let Err(e) = run(args.command, client, config).await {
        tracing::debug!(error = %e, "Command failed");
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}
