//! Padel Friends CLI - join a group once, then browse it from the terminal.
//!
//! Group passwords are saved locally, so later commands restore the most
//! recently used group without prompting again.

mod commands;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use padelfriends_core::{ApiClient, Config, CredentialStore, SessionContext, SessionOptions};

use commands::Command;

/// Log file name inside the data directory
const LOG_FILE: &str = "padelfriends.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a file in the data directory so command output stays clean;
/// stderr is used when no data directory is available.
fn init_tracing(config: &Config) -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = config
        .data_dir()
        .ok()
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());

    let (writer, guard) = match log_dir {
        Some(dir) => {
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let loaded = Config::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    let _log_guard = init_tracing(&config);
    if let Err(e) = &loaded {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            eprintln!("{}", commands::USAGE);
            std::process::exit(2);
        }
    };

    info!(api_url = %config.api_url, ?command, "Padel Friends starting");

    let api = ApiClient::new(&config.api_url)?;
    let credentials = CredentialStore::open(config.credential_backend()?);
    let session = SessionContext::new(Arc::new(api), credentials, SessionOptions::from(&config));

    commands::run(command, &session).await
}
