//! Command-line interface.
//!
//! `serve` runs the HTTP server; the remaining subcommands are the
//! administrative surface for provisioning that the web UI deliberately
//! lacks (roles and teams are assigned by an operator, never self-served).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use track_core::error::{Result, TrackError};
use track_core::model::Role;

use crate::config::Settings;
use crate::storage::SqliteStore;

#[derive(Parser)]
#[command(name = "trackd", version, about = "Issue tracking server")]
pub struct Cli {
    /// Database path (overrides TRACKD_DB).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Listen address (overrides TRACKD_BIND).
        #[arg(long)]
        bind: Option<String>,
    },

    /// Create the database schema and seed default statuses/priorities.
    Init,

    /// Create a team.
    AddTeam {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Assign a role to a user (product-owner, manager, developer).
    AssignRole { username: String, role: String },

    /// Assign a user to a team, or clear the assignment with --none.
    AssignTeam {
        username: String,
        team: Option<String>,
        #[arg(long, conflicts_with = "team")]
        none: bool,
    },
}

/// Seed rows created by `init` on an empty database.
const DEFAULT_STATUSES: [&str; 3] = ["Open", "In Progress", "Done"];
const DEFAULT_PRIORITIES: [&str; 3] = ["Low", "Normal", "High"];

/// Execute a parsed administrative command against the configured database.
///
/// `serve` has its own entry point; handing it here is a caller bug and
/// is rejected before the store is even opened.
///
/// # Errors
///
/// Propagates storage, validation, and configuration failures.
pub fn run_admin(command: &Command, settings: &Settings) -> Result<()> {
    let open = || SqliteStore::open(&settings.db_path);
    match command {
        Command::Serve { .. } => Err(TrackError::Config(
            "serve is not an administrative command".to_string(),
        )),
        Command::Init => init_db(&mut open()?),
        Command::AddTeam { name, description } => {
            let mut store = open()?;
            let team = store.create_team(name, description)?;
            info!(team = %team.name, id = team.id, "team created");
            Ok(())
        }
        Command::AssignRole { username, role } => {
            let role: Role = role.parse()?;
            let mut store = open()?;
            let user = require_user(&store, username)?;
            store.assign_role(user.id, role)?;
            info!(user = %username, role = %role, "role assigned");
            Ok(())
        }
        Command::AssignTeam {
            username,
            team,
            none,
        } => {
            let mut store = open()?;
            let user = require_user(&store, username)?;
            if *none {
                store.assign_team(user.id, None)?;
                info!(user = %username, "team cleared");
                return Ok(());
            }
            let Some(name) = team else {
                return Err(TrackError::validation("team", "team name required"));
            };
            let team = store
                .get_team_by_name(name)?
                .ok_or_else(|| TrackError::validation("team", format!("no such team: {name}")))?;
            store.assign_team(user.id, Some(team.id))?;
            info!(user = %username, team = %team.name, "team assigned");
            Ok(())
        }
    }
}

fn init_db(store: &mut SqliteStore) -> Result<()> {
    store.init_schema()?;
    if store.list_statuses()?.is_empty() {
        for name in DEFAULT_STATUSES {
            store.create_status(name, "")?;
        }
    }
    if store.list_priorities()?.is_empty() {
        for name in DEFAULT_PRIORITIES {
            store.create_priority(name, "")?;
        }
    }
    info!("database initialized");
    Ok(())
}

fn require_user(store: &SqliteStore, username: &str) -> Result<track_core::model::User> {
    store
        .get_user_by_username(username)?
        .ok_or_else(|| TrackError::validation("username", format!("no such user: {username}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    fn settings_for(path: &std::path::Path) -> Settings {
        Settings {
            bind: "127.0.0.1:0".parse().unwrap(),
            db_path: path.to_path_buf(),
            log_filter: "info".to_string(),
        }
    }

    #[test]
    fn serve_is_rejected_without_touching_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("untouched.db");

        let err = run_admin(&Command::Serve { bind: None }, &settings_for(&path)).unwrap_err();
        assert!(matches!(err, TrackError::Config(_)));
        assert!(!path.exists());
    }

    #[test]
    fn assign_role_accepts_documented_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store
                .create_user(&track_core::model::NewUser {
                    username: "alice".to_string(),
                    email: "alice@example.com".to_string(),
                    password_hash: "hash".to_string(),
                    first_name: String::new(),
                    last_name: String::new(),
                })
                .unwrap();
        }

        let command = Command::AssignRole {
            username: "alice".to_string(),
            role: "product-owner".to_string(),
        };
        run_admin(&command, &settings_for(&path)).unwrap();

        let store = SqliteStore::open(&path).unwrap();
        let alice = store.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(alice.role, Some(Role::ProductOwner));
    }

    #[test]
    fn init_seeds_lookup_rows_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let mut store = SqliteStore::open(&path).unwrap();

        init_db(&mut store).unwrap();
        init_db(&mut store).unwrap();

        let statuses = store.list_statuses().unwrap();
        assert_eq!(statuses.len(), 3);
        assert!(statuses.iter().any(|s| s.name == "Done"));
        assert_eq!(store.list_priorities().unwrap().len(), 3);
    }
}
