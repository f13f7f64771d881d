//! Error types for track-core.

use thiserror::Error;

/// Primary error type for tracker operations.
#[derive(Error, Debug)]
pub enum TrackError {
    // === Lookup Errors ===
    /// A record with the given primary key was not found.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: i64 },

    // === Authorization Errors ===
    /// An authorization predicate evaluated to false.
    #[error("Permission denied: {action}")]
    PermissionDenied { action: &'static str },

    /// No valid session accompanied the request.
    #[error("Authentication required")]
    Unauthenticated,

    /// Username/password pair did not match a user.
    #[error("Invalid username or password")]
    InvalidCredentials,

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Multiple validation errors occurred.
    #[error("Validation errors: {errors:?}")]
    ValidationErrors { errors: Vec<ValidationError> },

    /// Role string does not name a known role variant.
    #[error("Unknown role: {role}")]
    UnknownRole { role: String },

    /// Unique constraint violation (e.g. duplicate username).
    #[error("Already exists: {what}")]
    Conflict { what: String },

    // === Storage Errors ===
    /// Foreign-key constraint violation. Not handled specially by callers;
    /// surfaces as a server error.
    #[error("Integrity error: {message}")]
    Integrity { message: String },

    /// Generic storage failure.
    #[error("Storage error: {0}")]
    Storage(String),

    // === Operational Errors ===
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single field validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl TrackError {
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn not_found(what: &'static str, id: i64) -> Self {
        Self::NotFound { what, id }
    }

    #[must_use]
    pub const fn permission_denied(action: &'static str) -> Self {
        Self::PermissionDenied { action }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    #[must_use]
    pub fn from_validation_errors(errors: Vec<ValidationError>) -> Self {
        if errors.len() == 1 {
            let err = &errors[0];
            Self::Validation {
                field: err.field.clone(),
                reason: err.message.clone(),
            }
        } else {
            Self::ValidationErrors { errors }
        }
    }
}

/// Result type using `TrackError`.
pub type Result<T> = std::result::Result<T, TrackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_validation_error_collapses() {
        let err =
            TrackError::from_validation_errors(vec![ValidationError::new("summary", "too long")]);
        assert!(matches!(err, TrackError::Validation { ref field, .. } if field == "summary"));
    }

    #[test]
    fn multiple_validation_errors_kept() {
        let err = TrackError::from_validation_errors(vec![
            ValidationError::new("summary", "empty"),
            ValidationError::new("assignee_id", "missing"),
        ]);
        assert!(matches!(err, TrackError::ValidationErrors { ref errors } if errors.len() == 2));
    }

    #[test]
    fn display_includes_context() {
        let err = TrackError::not_found("Issue", 42);
        assert_eq!(err.to_string(), "Issue not found: 42");

        let err = TrackError::permission_denied("create issue");
        assert_eq!(err.to_string(), "Permission denied: create issue");
    }
}
