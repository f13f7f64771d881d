//! Request payloads for the HTTP surface.
//!
//! Issue payloads reuse the domain types directly (`NewIssue`,
//! `IssueUpdate`); only the account forms need their own shapes because
//! they carry a plaintext password that never reaches the domain layer.

use serde::Deserialize;

/// Signup form.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}
