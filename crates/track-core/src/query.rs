//! Query and update types for issue operations.

use serde::{Deserialize, Serialize};

use crate::model::{Issue, Status};

/// Fields to update on an issue.
///
/// `reporter_id` and `created_on` are deliberately absent: both are
/// immutable after creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueUpdate {
    pub summary: Option<String>,
    pub body: Option<String>,
    pub assignee_id: Option<i64>,
    pub status_id: Option<i64>,
    pub priority_id: Option<i64>,
}

impl IssueUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.body.is_none()
            && self.assignee_id.is_none()
            && self.status_id.is_none()
            && self.priority_id.is_none()
    }
}

/// Visibility scope for issue listings, derived from the requester's
/// role and team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// Managers see every issue.
    All,
    /// Everyone else sees issues whose assignee belongs to the named team.
    Team(String),
    /// Requester has no team assigned; nothing is visible.
    Empty,
}

/// Listing payload: scoped issues plus the full status set for UI
/// filtering (presentational only, no server-side status filter).
#[derive(Debug, Clone, Serialize)]
pub struct IssueListing {
    pub issues: Vec<Issue>,
    pub statuses: Vec<Status>,
}

/// One row of the completed-issue aggregate: a reporter and the number
/// of their issues whose status is "Done".
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportRow {
    pub username: String,
    pub done_count: i64,
}

/// Report payload: all issues newest-first plus the per-reporter
/// completed-issue counts, highest count first.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub issues: Vec<Issue>,
    pub reporters: Vec<ReportRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_detected() {
        assert!(IssueUpdate::default().is_empty());
        let update = IssueUpdate {
            summary: Some("S".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
