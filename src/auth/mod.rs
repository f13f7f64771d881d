//! Authentication: password hashing and session management.

pub mod password;
pub mod sessions;

pub use sessions::SESSION_COOKIE;
