//! Authorization predicates.
//!
//! Every check takes the current user explicitly; there is no ambient
//! request context. Checks short-circuit to `PermissionDenied` so callers
//! can bubble the failure straight to the HTTP layer. A user with no role
//! assigned fails every role check (denied, not an error).

use tracing::debug;

use crate::error::{Result, TrackError};
use crate::model::{Issue, Role, Team, User};
use crate::query::ListScope;

/// True if the user may create issues (Product Owner only).
#[must_use]
pub fn can_create_issue(user: &User) -> bool {
    user.has_role(Role::ProductOwner)
}

/// True if the user may edit the issue (reporter or assignee).
#[must_use]
pub fn can_edit_issue(user: &User, issue: &Issue) -> bool {
    issue.involves(user.id)
}

/// True if the user may delete the issue (reporter or assignee).
#[must_use]
pub fn can_delete_issue(user: &User, issue: &Issue) -> bool {
    issue.involves(user.id)
}

/// True if the user may view the report (Manager only).
#[must_use]
pub fn can_view_report(user: &User) -> bool {
    user.has_role(Role::Manager)
}

/// Require issue-creation capability.
///
/// # Errors
///
/// Returns `PermissionDenied` unless the user is a Product Owner.
pub fn require_create_issue(user: &User) -> Result<()> {
    require(can_create_issue(user), user, "create issue")
}

/// Require edit capability on a specific issue.
///
/// # Errors
///
/// Returns `PermissionDenied` unless the user is the issue's reporter
/// or assignee.
pub fn require_edit_issue(user: &User, issue: &Issue) -> Result<()> {
    require(can_edit_issue(user, issue), user, "edit issue")
}

/// Require delete capability on a specific issue.
///
/// # Errors
///
/// Returns `PermissionDenied` unless the user is the issue's reporter
/// or assignee.
pub fn require_delete_issue(user: &User, issue: &Issue) -> Result<()> {
    require(can_delete_issue(user, issue), user, "delete issue")
}

/// Require report-viewing capability.
///
/// # Errors
///
/// Returns `PermissionDenied` unless the user is a Manager.
pub fn require_view_report(user: &User) -> Result<()> {
    require(can_view_report(user), user, "view report")
}

/// Derive the listing scope for a requester.
///
/// Managers see everything. Everyone else is scoped to issues whose
/// assignee belongs to the requester's team; a requester with no team
/// sees an empty listing.
#[must_use]
pub fn list_scope(user: &User, team: Option<&Team>) -> ListScope {
    if user.has_role(Role::Manager) {
        return ListScope::All;
    }
    match team {
        Some(team) => ListScope::Team(team.name.clone()),
        None => ListScope::Empty,
    }
}

fn require(allowed: bool, user: &User, action: &'static str) -> Result<()> {
    if allowed {
        Ok(())
    } else {
        debug!(user = %user.username, action, "permission denied");
        Err(TrackError::permission_denied(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_user(id: i64, role: Option<Role>) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
            role,
            team_id: None,
            password_hash: String::new(),
        }
    }

    fn make_issue(reporter_id: i64, assignee_id: i64) -> Issue {
        Issue {
            id: 1,
            summary: "Test issue".to_string(),
            body: String::new(),
            assignee_id,
            reporter_id,
            status_id: 1,
            priority_id: 1,
            created_on: Utc::now(),
        }
    }

    #[test]
    fn only_product_owner_creates() {
        assert!(can_create_issue(&make_user(1, Some(Role::ProductOwner))));
        assert!(!can_create_issue(&make_user(2, Some(Role::Manager))));
        assert!(!can_create_issue(&make_user(3, Some(Role::Developer))));
        // No role assigned: denied, not an error.
        assert!(!can_create_issue(&make_user(4, None)));
    }

    #[test]
    fn reporter_and_assignee_may_edit_and_delete() {
        let issue = make_issue(1, 2);
        let reporter = make_user(1, None);
        let assignee = make_user(2, None);
        let stranger = make_user(3, Some(Role::Manager));

        assert!(can_edit_issue(&reporter, &issue));
        assert!(can_edit_issue(&assignee, &issue));
        assert!(!can_edit_issue(&stranger, &issue));

        assert!(can_delete_issue(&reporter, &issue));
        assert!(can_delete_issue(&assignee, &issue));
        assert!(!can_delete_issue(&stranger, &issue));
    }

    #[test]
    fn only_manager_views_report() {
        assert!(can_view_report(&make_user(1, Some(Role::Manager))));
        assert!(!can_view_report(&make_user(2, Some(Role::ProductOwner))));
        assert!(!can_view_report(&make_user(3, None)));
    }

    #[test]
    fn require_helpers_surface_permission_denied() {
        let stranger = make_user(3, None);
        let issue = make_issue(1, 2);

        let err = require_create_issue(&stranger).unwrap_err();
        assert!(matches!(err, TrackError::PermissionDenied { .. }));

        let err = require_edit_issue(&stranger, &issue).unwrap_err();
        assert!(matches!(err, TrackError::PermissionDenied { .. }));

        let err = require_delete_issue(&stranger, &issue).unwrap_err();
        assert!(matches!(err, TrackError::PermissionDenied { .. }));

        let err = require_view_report(&stranger).unwrap_err();
        assert!(matches!(err, TrackError::PermissionDenied { .. }));
    }

    #[test]
    fn manager_scope_is_unrestricted() {
        let manager = make_user(1, Some(Role::Manager));
        assert_eq!(list_scope(&manager, None), ListScope::All);
    }

    #[test]
    fn team_member_scope_is_team_name() {
        let dev = make_user(1, Some(Role::Developer));
        let team = Team {
            id: 1,
            name: "Platform".to_string(),
            description: String::new(),
        };
        assert_eq!(
            list_scope(&dev, Some(&team)),
            ListScope::Team("Platform".to_string())
        );
    }

    #[test]
    fn no_team_scope_is_empty() {
        let dev = make_user(1, Some(Role::Developer));
        assert_eq!(list_scope(&dev, None), ListScope::Empty);
    }
}
