//! Core data types for track-core.
//!
//! Lookup rows (Team, Status, Priority) are admin-curated reference data;
//! Role is a closed enumeration so capability checks never depend on
//! operator-entered strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Maximum length of an issue summary, in characters.
pub const MAX_SUMMARY_LEN: usize = 256;

/// Status name that marks an issue as completed for reporting.
pub const DONE_STATUS: &str = "Done";

/// Permission class assigned to a user.
///
/// A closed set: unknown role strings are rejected at the boundary instead
/// of silently failing every capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    ProductOwner,
    Manager,
    Developer,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProductOwner => "Product Owner",
            Self::Manager => "Manager",
            Self::Developer => "Developer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = crate::error::TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "product owner" => Ok(Self::ProductOwner),
            "manager" => Ok(Self::Manager),
            "developer" => Ok(Self::Developer),
            other => Err(crate::error::TrackError::UnknownRole {
                role: other.to_string(),
            }),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::from_str(&value).map_err(serde::de::Error::custom)
    }
}

/// Named grouping of users used to scope issue visibility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Lifecycle state label for an issue (e.g. "Done").
///
/// No workflow is enforced between statuses; the label is free-standing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Status {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl Status {
    /// True if this status marks an issue as completed for the report.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.name == DONE_STATUS
    }
}

/// Priority label for an issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Priority {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// An authenticated account.
///
/// Role and team are unset at signup; an administrator provisions them later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,

    /// Argon2id hash, never serialized.
    #[serde(skip)]
    pub password_hash: String,
}

impl User {
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }
}

/// A trackable work item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    pub id: i64,

    /// Short summary (1..=256 chars).
    pub summary: String,

    /// Unbounded description text.
    pub body: String,

    /// User responsible for resolving the issue.
    pub assignee_id: i64,

    /// User who created the issue. Immutable after creation.
    pub reporter_id: i64,

    pub status_id: i64,
    pub priority_id: i64,

    /// Set once at creation, never updated.
    pub created_on: DateTime<Utc>,
}

impl Issue {
    /// True if `user_id` is the reporter or the assignee.
    #[must_use]
    pub const fn involves(&self, user_id: i64) -> bool {
        self.reporter_id == user_id || self.assignee_id == user_id
    }
}

/// Fields stored for a new account. The password is already hashed by
/// the time it reaches storage.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// Fields supplied by the caller when creating an issue.
///
/// The reporter is never part of the form; it is taken from the
/// authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIssue {
    pub summary: String,
    #[serde(default)]
    pub body: String,
    pub assignee_id: i64,
    pub status_id: i64,
    pub priority_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::ProductOwner, Role::Manager, Role::Developer] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!("product owner".parse::<Role>().unwrap(), Role::ProductOwner);
        assert_eq!("PRODUCT_OWNER".parse::<Role>().unwrap(), Role::ProductOwner);
        assert_eq!("product-owner".parse::<Role>().unwrap(), Role::ProductOwner);
        assert_eq!(" manager ".parse::<Role>().unwrap(), Role::Manager);
    }

    #[test]
    fn role_parse_rejects_unknown() {
        assert!("Scrum Lord".parse::<Role>().is_err());
    }

    #[test]
    fn status_done_check() {
        let done = Status {
            id: 1,
            name: "Done".to_string(),
            description: String::new(),
        };
        let open = Status {
            id: 2,
            name: "Open".to_string(),
            description: String::new(),
        };
        assert!(done.is_done());
        assert!(!open.is_done());
    }

    #[test]
    fn issue_involves_reporter_and_assignee() {
        let issue = Issue {
            id: 1,
            summary: "S".to_string(),
            body: String::new(),
            assignee_id: 7,
            reporter_id: 9,
            status_id: 1,
            priority_id: 1,
            created_on: chrono::Utc::now(),
        };
        assert!(issue.involves(7));
        assert!(issue.involves(9));
        assert!(!issue.involves(11));
    }

    #[test]
    fn user_serialization_hides_password_hash() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            role: Some(Role::Manager),
            team_id: None,
            password_hash: "secret".to_string(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"Manager\""));
    }
}
