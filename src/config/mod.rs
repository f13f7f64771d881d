//! Runtime configuration.
//!
//! Settings come from environment variables, with CLI flags taking
//! precedence:
//!
//! - `TRACKD_BIND` — listen address (default `127.0.0.1:8000`)
//! - `TRACKD_DB`   — database path (default `tracker.db`)
//! - `TRACKD_LOG`  — log filter (default `info`)

use std::net::SocketAddr;
use std::path::PathBuf;

use track_core::error::{Result, TrackError};

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_DB: &str = "tracker.db";
pub const DEFAULT_LOG: &str = "info";

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub log_filter: String,
}

impl Settings {
    /// Resolve settings from the environment, applying CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the bind address does not parse.
    pub fn resolve(bind: Option<String>, db: Option<PathBuf>) -> Result<Self> {
        let bind = bind
            .or_else(|| std::env::var("TRACKD_BIND").ok())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind
            .parse::<SocketAddr>()
            .map_err(|err| TrackError::Config(format!("invalid bind address {bind:?}: {err}")))?;

        let db_path = db
            .or_else(|| std::env::var("TRACKD_DB").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB));

        let log_filter =
            std::env::var("TRACKD_LOG").unwrap_or_else(|_| DEFAULT_LOG.to_string());

        Ok(Self {
            bind,
            db_path,
            log_filter,
        })
    }
}
