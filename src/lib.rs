//! trackd — a small issue-tracking web server.
//!
//! Domain rules live in the `track-core` crate; this crate provides the
//! SQLite storage layer, the HTTP surface, authentication, and the CLI.

#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use tracing::info;

use track_core::error::Result;

pub mod auth;
pub mod cli;
pub mod config;
pub mod http;
pub mod logging;
pub mod storage;

use cli::{Cli, Command};
use config::Settings;
use http::AppState;
use storage::SqliteStore;

/// Parse arguments and run the selected command.
///
/// # Errors
///
/// Propagates configuration, storage, and server failures.
pub async fn run() -> Result<()> {
    let args = Cli::parse();

    let bind = match &args.command {
        Command::Serve { bind } => bind.clone(),
        _ => None,
    };
    let settings = Settings::resolve(bind, args.db.clone())?;
    logging::init(&settings.log_filter);

    match args.command {
        Command::Serve { .. } => serve(&settings).await,
        other => cli::run_admin(&other, &settings),
    }
}

async fn serve(settings: &Settings) -> Result<()> {
    let store = SqliteStore::open(&settings.db_path)?;
    let app = http::router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(settings.bind).await?;
    info!(bind = %settings.bind, db = %settings.db_path.display(), "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
