//! Validation helpers for issue form input.
//!
//! These routines check field constraints only; referential checks
//! (assignee/status/priority existence) belong to the storage layer.

use crate::error::ValidationError;
use crate::model::{MAX_SUMMARY_LEN, NewIssue};
use crate::query::IssueUpdate;

/// Validates issue form fields.
pub struct IssueValidator;

impl IssueValidator {
    /// Validate a creation form and return all validation errors found.
    ///
    /// # Errors
    ///
    /// Returns a `Vec<ValidationError>` if any validation rules are violated.
    pub fn validate_new(issue: &NewIssue) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        check_summary(&issue.summary, &mut errors);
        check_reference("assignee_id", issue.assignee_id, &mut errors);
        check_reference("status_id", issue.status_id, &mut errors);
        check_reference("priority_id", issue.priority_id, &mut errors);

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Validate an update form and return all validation errors found.
    ///
    /// # Errors
    ///
    /// Returns a `Vec<ValidationError>` if any validation rules are violated.
    pub fn validate_update(update: &IssueUpdate) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if update.is_empty() {
            errors.push(ValidationError::new("fields", "no fields to update"));
        }
        if let Some(summary) = update.summary.as_ref() {
            check_summary(summary, &mut errors);
        }
        if let Some(id) = update.assignee_id {
            check_reference("assignee_id", id, &mut errors);
        }
        if let Some(id) = update.status_id {
            check_reference("status_id", id, &mut errors);
        }
        if let Some(id) = update.priority_id {
            check_reference("priority_id", id, &mut errors);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Validates signup form fields.
pub struct SignupValidator;

impl SignupValidator {
    /// Validate username/email/password and return all errors found.
    ///
    /// # Errors
    ///
    /// Returns a `Vec<ValidationError>` if any validation rules are violated.
    pub fn validate(
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if username.trim().is_empty() {
            errors.push(ValidationError::new("username", "cannot be empty"));
        }
        if username.len() > 150 {
            errors.push(ValidationError::new("username", "exceeds 150 characters"));
        }
        if username.chars().any(char::is_whitespace) {
            errors.push(ValidationError::new(
                "username",
                "cannot contain whitespace",
            ));
        }
        if email.trim().is_empty() || !email.contains('@') {
            errors.push(ValidationError::new("email", "must be a valid address"));
        }
        if password.len() < 8 {
            errors.push(ValidationError::new(
                "password",
                "must be at least 8 characters",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn check_summary(summary: &str, errors: &mut Vec<ValidationError>) {
    if summary.trim().is_empty() {
        errors.push(ValidationError::new("summary", "cannot be empty"));
    }
    if summary.chars().count() > MAX_SUMMARY_LEN {
        errors.push(ValidationError::new("summary", "exceeds 256 characters"));
    }
}

fn check_reference(field: &str, id: i64, errors: &mut Vec<ValidationError>) {
    if id <= 0 {
        errors.push(ValidationError::new(field, "missing required reference"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_form() -> NewIssue {
        NewIssue {
            summary: "Fix login redirect".to_string(),
            body: "Details".to_string(),
            assignee_id: 1,
            status_id: 1,
            priority_id: 1,
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(IssueValidator::validate_new(&base_form()).is_ok());
    }

    #[test]
    fn empty_summary_rejected() {
        let mut form = base_form();
        form.summary = "  ".to_string();
        let errors = IssueValidator::validate_new(&form).unwrap_err();
        assert!(errors.iter().any(|err| err.field == "summary"));
    }

    #[test]
    fn overlong_summary_rejected() {
        let mut form = base_form();
        form.summary = "x".repeat(MAX_SUMMARY_LEN + 1);
        let errors = IssueValidator::validate_new(&form).unwrap_err();
        assert!(errors.iter().any(|err| err.field == "summary"));
    }

    #[test]
    fn summary_at_limit_accepted() {
        let mut form = base_form();
        form.summary = "x".repeat(MAX_SUMMARY_LEN);
        assert!(IssueValidator::validate_new(&form).is_ok());
    }

    #[test]
    fn missing_references_collected() {
        let mut form = base_form();
        form.assignee_id = 0;
        form.status_id = -1;
        let errors = IssueValidator::validate_new(&form).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|err| err.field.as_str()).collect();
        assert!(fields.contains(&"assignee_id"));
        assert!(fields.contains(&"status_id"));
    }

    #[test]
    fn empty_update_rejected() {
        let errors = IssueValidator::validate_update(&IssueUpdate::default()).unwrap_err();
        assert!(errors.iter().any(|err| err.field == "fields"));
    }

    #[test]
    fn update_summary_checked() {
        let update = IssueUpdate {
            summary: Some(String::new()),
            ..Default::default()
        };
        let errors = IssueValidator::validate_update(&update).unwrap_err();
        assert!(errors.iter().any(|err| err.field == "summary"));
    }

    #[test]
    fn signup_rejects_bad_input() {
        let errors = SignupValidator::validate("", "not-an-email", "short").unwrap_err();
        let fields: Vec<_> = errors.iter().map(|err| err.field.as_str()).collect();
        assert!(fields.contains(&"username"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
    }

    #[test]
    fn signup_accepts_valid_input() {
        assert!(SignupValidator::validate("alice", "alice@example.com", "longenough").is_ok());
    }
}
