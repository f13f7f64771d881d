//! `track-core` — Domain model and authorization rules for trackd.
//!
//! Provides the entity types, per-action authorization predicates, and
//! form validation used by the `trackd` server. No SQLite, no HTTP.
//!
//! # Quick Start
//!
//! ```
//! use track_core::authz;
//! use track_core::model::{Role, User};
//!
//! let user = User {
//!     id: 1,
//!     username: "alice".into(),
//!     email: "alice@example.com".into(),
//!     first_name: String::new(),
//!     last_name: String::new(),
//!     role: Some(Role::ProductOwner),
//!     team_id: None,
//!     password_hash: String::new(),
//! };
//! assert!(authz::can_create_issue(&user));
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod authz;
pub mod error;
pub mod model;
pub mod query;
pub mod validation;

pub use error::{Result, TrackError, ValidationError};
pub use model::{Issue, NewIssue, NewUser, Priority, Role, Status, Team, User};
pub use query::{IssueListing, IssueUpdate, ListScope, Report, ReportRow};
