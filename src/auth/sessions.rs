//! Cookie-backed sessions.
//!
//! Tokens are random, opaque, and stored server-side; the cookie carries
//! only the token.

use tracing::info;
use uuid::Uuid;

use track_core::error::{Result, TrackError};
use track_core::model::User;

use crate::auth::password;
use crate::storage::SqliteStore;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "trackd_session";

/// Verify credentials and open a session.
///
/// Returns the user and the new session token.
///
/// # Errors
///
/// Returns `InvalidCredentials` if the username is unknown or the
/// password does not match. The two cases are indistinguishable to the
/// caller.
pub fn login(store: &mut SqliteStore, username: &str, password: &str) -> Result<(User, String)> {
    let Some(user) = store.get_user_by_username(username)? else {
        return Err(TrackError::InvalidCredentials);
    };
    if !password::verify_password(password, &user.password_hash)
        .map_err(TrackError::from)?
    {
        return Err(TrackError::InvalidCredentials);
    }

    let token = Uuid::new_v4().simple().to_string();
    store.create_session(&token, user.id)?;
    info!(user = %user.username, "session opened");
    Ok((user, token))
}

/// Close a session. Unknown tokens are ignored.
///
/// # Errors
///
/// Returns `Storage` on delete failure.
pub fn logout(store: &mut SqliteStore, token: &str) -> Result<()> {
    store.delete_session(token)
}

/// Resolve a session token to its user.
///
/// # Errors
///
/// Returns `Unauthenticated` if the token does not name a live session.
pub fn authenticate(store: &SqliteStore, token: &str) -> Result<User> {
    store
        .session_user(token)?
        .ok_or(TrackError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use track_core::model::NewUser;

    fn store_with_user(username: &str, pw: &str) -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .create_user(&NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: password::hash_password(pw).unwrap(),
                first_name: String::new(),
                last_name: String::new(),
            })
            .unwrap();
        store
    }

    #[test]
    fn login_logout_cycle() {
        let mut store = store_with_user("alice", "correct horse");

        let (user, token) = login(&mut store, "alice", "correct horse").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(authenticate(&store, &token).unwrap().id, user.id);

        logout(&mut store, &token).unwrap();
        assert!(matches!(
            authenticate(&store, &token),
            Err(TrackError::Unauthenticated)
        ));
    }

    #[test]
    fn wrong_password_and_unknown_user_look_identical() {
        let mut store = store_with_user("alice", "correct horse");

        let wrong = login(&mut store, "alice", "battery staple").unwrap_err();
        let unknown = login(&mut store, "nobody", "battery staple").unwrap_err();
        assert!(matches!(wrong, TrackError::InvalidCredentials));
        assert!(matches!(unknown, TrackError::InvalidCredentials));
    }
}
