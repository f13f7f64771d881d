//! `SQLite` storage layer for `trackd`.
//!
//! This module provides the persistence layer using `SQLite` with:
//! - WAL mode for concurrent reads
//! - Transaction discipline for atomic writes
//! - `foreign_keys=ON` so deleting referenced lookup rows cascades to
//!   dependent issues
//!
//! Timestamps are stored as RFC 3339 text; roles as their display name.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

use track_core::error::{Result, TrackError};
use track_core::model::{
    DONE_STATUS, Issue, NewIssue, NewUser, Priority, Role, Status, Team, User,
};
use track_core::query::{IssueUpdate, ListScope, Report, ReportRow};
use track_core::validation::IssueValidator;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS teams (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS statuses (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS priorities (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    first_name    TEXT NOT NULL DEFAULT '',
    last_name     TEXT NOT NULL DEFAULT '',
    role          TEXT,
    team_id       INTEGER REFERENCES teams(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS issues (
    id          INTEGER PRIMARY KEY,
    summary     TEXT NOT NULL,
    body        TEXT NOT NULL DEFAULT '',
    assignee_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    reporter_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    status_id   INTEGER NOT NULL REFERENCES statuses(id) ON DELETE CASCADE,
    priority_id INTEGER NOT NULL REFERENCES priorities(id) ON DELETE CASCADE,
    created_on  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_issues_assignee ON issues(assignee_id);
CREATE INDEX IF NOT EXISTS idx_issues_reporter ON issues(reporter_id);
CREATE INDEX IF NOT EXISTS idx_issues_status   ON issues(status_id);

CREATE TABLE IF NOT EXISTS sessions (
    token      TEXT PRIMARY KEY,
    user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL
);
";

/// `SQLite`-backed tracker store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open (creating if needed) a database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the database cannot be opened or configured.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err)?;
        let store = Self { conn };
        store.configure()?;
        store.init_schema()?;
        info!(path = %path.as_ref().display(), "opened tracker database");
        Ok(store)
    }

    /// Open an in-memory database (tests and ephemeral runs).
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the database cannot be opened or configured.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        let store = Self { conn };
        store.configure()?;
        store.init_schema()?;
        Ok(store)
    }

    fn configure(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA journal_mode = WAL;
                 PRAGMA busy_timeout = 5000;",
            )
            .map_err(db_err)
    }

    /// Create all tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on DDL failure.
    pub fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA).map_err(db_err)
    }

    // ========================================================================
    // Lookup data (admin-curated; never auto-deleted by application logic)
    // ========================================================================

    /// Insert a team.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on insert failure.
    pub fn create_team(&mut self, name: &str, description: &str) -> Result<Team> {
        self.conn
            .execute(
                "INSERT INTO teams (name, description) VALUES (?1, ?2)",
                params![name, description],
            )
            .map_err(db_err)?;
        Ok(Team {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            description: description.to_string(),
        })
    }

    /// Get a team by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such team exists.
    pub fn get_team(&self, id: i64) -> Result<Team> {
        self.conn
            .query_row(
                "SELECT id, name, description FROM teams WHERE id = ?1",
                params![id],
                team_from_row,
            )
            .optional()
            .map_err(db_err)?
            .ok_or(TrackError::not_found("Team", id))
    }

    /// Look up a team by name.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on query failure.
    pub fn get_team_by_name(&self, name: &str) -> Result<Option<Team>> {
        self.conn
            .query_row(
                "SELECT id, name, description FROM teams WHERE name = ?1",
                params![name],
                team_from_row,
            )
            .optional()
            .map_err(db_err)
    }

    /// Insert a status.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on insert failure.
    pub fn create_status(&mut self, name: &str, description: &str) -> Result<Status> {
        self.conn
            .execute(
                "INSERT INTO statuses (name, description) VALUES (?1, ?2)",
                params![name, description],
            )
            .map_err(db_err)?;
        Ok(Status {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            description: description.to_string(),
        })
    }

    /// All statuses, for the listing view's UI filter.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on query failure.
    pub fn list_statuses(&self) -> Result<Vec<Status>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM statuses ORDER BY id")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], status_from_row)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    /// Delete a status. Cascades deletion of issues holding it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such status exists.
    pub fn delete_status(&mut self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM statuses WHERE id = ?1", params![id])
            .map_err(db_err)?;
        if changed == 0 {
            return Err(TrackError::not_found("Status", id));
        }
        Ok(())
    }

    /// Insert a priority.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on insert failure.
    pub fn create_priority(&mut self, name: &str, description: &str) -> Result<Priority> {
        self.conn
            .execute(
                "INSERT INTO priorities (name, description) VALUES (?1, ?2)",
                params![name, description],
            )
            .map_err(db_err)?;
        Ok(Priority {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            description: description.to_string(),
        })
    }

    /// All priorities in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on query failure.
    pub fn list_priorities(&self) -> Result<Vec<Priority>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM priorities ORDER BY id")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Priority {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                })
            })
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    /// Delete a priority. Cascades deletion of issues holding it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such priority exists.
    pub fn delete_priority(&mut self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM priorities WHERE id = ?1", params![id])
            .map_err(db_err)?;
        if changed == 0 {
            return Err(TrackError::not_found("Priority", id));
        }
        Ok(())
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Create a user with unassigned role/team.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the username is taken.
    pub fn create_user(&mut self, new: &NewUser) -> Result<User> {
        let result = self.conn.execute(
            "INSERT INTO users (username, email, password_hash, first_name, last_name)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new.username,
                new.email,
                new.password_hash,
                new.first_name,
                new.last_name
            ],
        );
        if let Err(err) = result {
            if is_unique_violation(&err, "users.username") {
                return Err(TrackError::Conflict {
                    what: format!("username {}", new.username),
                });
            }
            return Err(db_err(err));
        }
        let id = self.conn.last_insert_rowid();
        info!(user_id = id, username = %new.username, "user created");
        self.get_user(id)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such user exists.
    pub fn get_user(&self, id: i64) -> Result<User> {
        self.conn
            .query_row(
                "SELECT id, username, email, password_hash, first_name, last_name, role, team_id
                 FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
            .optional()
            .map_err(db_err)?
            .ok_or(TrackError::not_found("User", id))
    }

    /// Look up a user by username.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on query failure.
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, username, email, password_hash, first_name, last_name, role, team_id
                 FROM users WHERE username = ?1",
                params![username],
                user_from_row,
            )
            .optional()
            .map_err(db_err)
    }

    /// Administrative: set a user's role.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such user exists.
    pub fn assign_role(&mut self, user_id: i64, role: Role) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE users SET role = ?1 WHERE id = ?2",
                params![role.as_str(), user_id],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(TrackError::not_found("User", user_id));
        }
        Ok(())
    }

    /// Administrative: set or clear a user's team.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such user exists.
    pub fn assign_team(&mut self, user_id: i64, team_id: Option<i64>) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE users SET team_id = ?1 WHERE id = ?2",
                params![team_id, user_id],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(TrackError::not_found("User", user_id));
        }
        Ok(())
    }

    /// The user's team, if any.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on query failure.
    pub fn get_user_team(&self, user: &User) -> Result<Option<Team>> {
        user.team_id.map(|id| self.get_team(id)).transpose()
    }

    /// Delete a user. Cascades deletion of issues they report or are
    /// assigned to.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such user exists.
    pub fn delete_user(&mut self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])
            .map_err(db_err)?;
        if changed == 0 {
            return Err(TrackError::not_found("User", id));
        }
        Ok(())
    }

    // ========================================================================
    // Issues
    // ========================================================================

    /// Create an issue. The reporter is the authenticated creator and
    /// `created_on` is server-assigned.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the form is invalid or a referenced
    /// assignee/status/priority does not exist.
    pub fn create_issue(&mut self, form: &NewIssue, reporter_id: i64) -> Result<Issue> {
        IssueValidator::validate_new(form).map_err(TrackError::from_validation_errors)?;

        let tx = self.conn.transaction().map_err(db_err)?;
        require_ref(&tx, RefTable::Users, "assignee_id", form.assignee_id)?;
        require_ref(&tx, RefTable::Statuses, "status_id", form.status_id)?;
        require_ref(&tx, RefTable::Priorities, "priority_id", form.priority_id)?;

        let created_on = Utc::now();
        tx.execute(
            "INSERT INTO issues (summary, body, assignee_id, reporter_id, status_id, priority_id, created_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                form.summary,
                form.body,
                form.assignee_id,
                reporter_id,
                form.status_id,
                form.priority_id,
                created_on.to_rfc3339()
            ],
        )
        .map_err(db_err)?;
        let id = tx.last_insert_rowid();
        tx.commit().map_err(db_err)?;

        info!(issue_id = id, reporter_id, "issue created");
        Ok(Issue {
            id,
            summary: form.summary.clone(),
            body: form.body.clone(),
            assignee_id: form.assignee_id,
            reporter_id,
            status_id: form.status_id,
            priority_id: form.priority_id,
            created_on,
        })
    }

    /// Get an issue by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such issue exists.
    pub fn get_issue(&self, id: i64) -> Result<Issue> {
        self.conn
            .query_row(
                "SELECT id, summary, body, assignee_id, reporter_id, status_id, priority_id, created_on
                 FROM issues WHERE id = ?1",
                params![id],
                issue_from_row,
            )
            .optional()
            .map_err(db_err)?
            .ok_or(TrackError::not_found("Issue", id))
    }

    /// Update an issue's mutable fields. Reporter and `created_on` are
    /// never touched.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the issue doesn't exist, or `Validation`
    /// if the update is empty/invalid or references a missing row.
    pub fn update_issue(&mut self, id: i64, update: &IssueUpdate) -> Result<Issue> {
        IssueValidator::validate_update(update).map_err(TrackError::from_validation_errors)?;

        let tx = self.conn.transaction().map_err(db_err)?;
        let mut issue = tx
            .query_row(
                "SELECT id, summary, body, assignee_id, reporter_id, status_id, priority_id, created_on
                 FROM issues WHERE id = ?1",
                params![id],
                issue_from_row,
            )
            .optional()
            .map_err(db_err)?
            .ok_or(TrackError::not_found("Issue", id))?;

        if let Some(ref summary) = update.summary {
            issue.summary.clone_from(summary);
        }
        if let Some(ref body) = update.body {
            issue.body.clone_from(body);
        }
        if let Some(assignee_id) = update.assignee_id {
            require_ref(&tx, RefTable::Users, "assignee_id", assignee_id)?;
            issue.assignee_id = assignee_id;
        }
        if let Some(status_id) = update.status_id {
            require_ref(&tx, RefTable::Statuses, "status_id", status_id)?;
            issue.status_id = status_id;
        }
        if let Some(priority_id) = update.priority_id {
            require_ref(&tx, RefTable::Priorities, "priority_id", priority_id)?;
            issue.priority_id = priority_id;
        }

        tx.execute(
            "UPDATE issues SET summary = ?1, body = ?2, assignee_id = ?3, status_id = ?4, priority_id = ?5
             WHERE id = ?6",
            params![
                issue.summary,
                issue.body,
                issue.assignee_id,
                issue.status_id,
                issue.priority_id,
                id
            ],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)?;

        Ok(issue)
    }

    /// Delete an issue.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such issue exists.
    pub fn delete_issue(&mut self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM issues WHERE id = ?1", params![id])
            .map_err(db_err)?;
        if changed == 0 {
            return Err(TrackError::not_found("Issue", id));
        }
        info!(issue_id = id, "issue deleted");
        Ok(())
    }

    /// List issues within the given visibility scope.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on query failure.
    pub fn list_issues(&self, scope: &ListScope) -> Result<Vec<Issue>> {
        match scope {
            ListScope::All => self.collect_issues(
                "SELECT id, summary, body, assignee_id, reporter_id, status_id, priority_id, created_on
                 FROM issues ORDER BY id",
                params![],
            ),
            ListScope::Team(name) => self.collect_issues(
                "SELECT i.id, i.summary, i.body, i.assignee_id, i.reporter_id, i.status_id, i.priority_id, i.created_on
                 FROM issues i
                 JOIN users a ON a.id = i.assignee_id
                 JOIN teams t ON t.id = a.team_id
                 WHERE t.name = ?1
                 ORDER BY i.id",
                params![name],
            ),
            ListScope::Empty => Ok(Vec::new()),
        }
    }

    /// Build the report: all issues newest-first, plus per-reporter
    /// counts of issues whose status is "Done", highest count first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on query failure.
    pub fn report(&self) -> Result<Report> {
        let issues = self.collect_issues(
            "SELECT id, summary, body, assignee_id, reporter_id, status_id, priority_id, created_on
             FROM issues ORDER BY created_on DESC, id DESC",
            params![],
        )?;

        let mut stmt = self
            .conn
            .prepare(
                "SELECT u.username, COUNT(*) AS done_count
                 FROM issues i
                 JOIN users u ON u.id = i.reporter_id
                 JOIN statuses s ON s.id = i.status_id
                 WHERE s.name = ?1
                 GROUP BY u.username
                 ORDER BY done_count DESC, u.username",
            )
            .map_err(db_err)?;
        let reporters = stmt
            .query_map(params![DONE_STATUS], |row| {
                Ok(ReportRow {
                    username: row.get(0)?,
                    done_count: row.get(1)?,
                })
            })
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;

        Ok(Report { issues, reporters })
    }

    fn collect_issues(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<Issue>> {
        let mut stmt = self.conn.prepare(sql).map_err(db_err)?;
        let rows = stmt
            .query_map(args, issue_from_row)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Persist a session token for a user.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on insert failure.
    pub fn create_session(&mut self, token: &str, user_id: i64) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![token, user_id, Utc::now().to_rfc3339()],
            )
            .map_err(db_err)?;
        Ok(())
    }

    /// Resolve a session token to its user, if the session exists.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on query failure.
    pub fn session_user(&self, token: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT u.id, u.username, u.email, u.password_hash, u.first_name, u.last_name, u.role, u.team_id
                 FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?1",
                params![token],
                user_from_row,
            )
            .optional()
            .map_err(db_err)
    }

    /// Remove a session (logout). Removing an unknown token is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on delete failure.
    pub fn delete_session(&mut self, token: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])
            .map_err(db_err)?;
        Ok(())
    }
}

// ============================================================================
// Row mappers and error mapping
// ============================================================================

#[derive(Clone, Copy)]
enum RefTable {
    Users,
    Statuses,
    Priorities,
}

impl RefTable {
    const fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Statuses => "statuses",
            Self::Priorities => "priorities",
        }
    }
}

fn require_ref(conn: &Connection, table: RefTable, field: &str, id: i64) -> Result<()> {
    let found: Option<i64> = conn
        .query_row(
            &format!("SELECT id FROM {} WHERE id = ?1", table.name()),
            params![id],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_err)?;
    if found.is_none() {
        return Err(TrackError::validation(field, "missing required reference"));
    }
    Ok(())
}

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

fn status_from_row(row: &Row<'_>) -> rusqlite::Result<Status> {
    Ok(Status {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: Option<String> = row.get(6)?;
    let role = role
        .map(|value| {
            value.parse::<Role>().map_err(|err| {
                rusqlite::Error::FromSqlConversionFailure(
                    6,
                    rusqlite::types::Type::Text,
                    Box::new(err),
                )
            })
        })
        .transpose()?;

    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        role,
        team_id: row.get(7)?,
    })
}

fn issue_from_row(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let created_on: String = row.get(7)?;
    let created_on = parse_timestamp(&created_on, 7)?;

    Ok(Issue {
        id: row.get(0)?,
        summary: row.get(1)?,
        body: row.get(2)?,
        assignee_id: row.get(3)?,
        reporter_id: row.get(4)?,
        status_id: row.get(5)?,
        priority_id: row.get(6)?,
        created_on,
    })
}

fn parse_timestamp(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(err),
            )
        })
}

fn is_unique_violation(err: &rusqlite::Error, constraint: &str) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(_, Some(message))
            if message.contains("UNIQUE constraint failed") && message.contains(constraint)
    )
}

fn db_err(err: rusqlite::Error) -> TrackError {
    match err {
        rusqlite::Error::SqliteFailure(e, message)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            TrackError::Integrity {
                message: message.unwrap_or_else(|| e.to_string()),
            }
        }
        other => TrackError::Storage(other.to_string()),
    }
}
