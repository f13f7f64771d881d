//! HTTP surface for trackd.
//!
//! Routes follow the account/issue layout the frontend expects; all
//! mutation routes are POSTs. Handlers take the authenticated user as an
//! explicit `CurrentUser` extractor parameter, never from ambient state.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use serde_json::json;
use tracing::error;

use track_core::error::TrackError;
use track_core::model::User;

use crate::auth::{SESSION_COOKIE, sessions};
use crate::storage::SqliteStore;

pub mod dto;
pub mod handlers;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<SqliteStore>>,
}

impl AppState {
    #[must_use]
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Lock the store for the duration of one handler.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the lock is poisoned.
    pub fn store(&self) -> Result<MutexGuard<'_, SqliteStore>, AppError> {
        self.store
            .lock()
            .map_err(|_| AppError(TrackError::internal("store lock poisoned")))
    }
}

/// Build the application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/accounts/signup/", post(handlers::signup))
        .route("/accounts/login/", post(handlers::login))
        .route("/accounts/logout/", post(handlers::logout))
        .route("/issues/", get(handlers::list_issues))
        .route("/issues/new/", post(handlers::create_issue))
        .route("/issues/report/", get(handlers::report))
        .route("/issues/:id/", get(handlers::issue_detail))
        .route("/issues/:id/edit/", post(handlers::edit_issue))
        .route("/issues/:id/delete/", post(handlers::delete_issue))
        .with_state(state)
}

/// The authenticated requester, resolved from the session cookie.
///
/// Requests without a live session are redirected to the login route.
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(parts) else {
            return Err(login_redirect());
        };
        let store = state.store().map_err(IntoResponse::into_response)?;
        match sessions::authenticate(&store, &token) {
            Ok(user) => Ok(Self { user, token }),
            Err(TrackError::Unauthenticated) => Err(login_redirect()),
            Err(err) => Err(AppError(err).into_response()),
        }
    }
}

fn session_token(parts: &Parts) -> Option<String> {
    let cookies = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

fn login_redirect() -> Response {
    Redirect::to("/accounts/login/").into_response()
}

/// Wrapper mapping domain errors onto HTTP responses.
pub struct AppError(pub TrackError);

impl From<TrackError> for AppError {
    fn from(err: TrackError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            TrackError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            TrackError::PermissionDenied { .. } => (StatusCode::FORBIDDEN, "permission_denied"),
            TrackError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            TrackError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            TrackError::Validation { .. }
            | TrackError::ValidationErrors { .. }
            | TrackError::UnknownRole { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
            TrackError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            err => {
                error!(%err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal server error".to_string()
        } else {
            self.0.to_string()
        };

        let body = axum::Json(json!({ "code": code, "message": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_expected_statuses() {
        let cases = [
            (TrackError::not_found("Issue", 1), StatusCode::NOT_FOUND),
            (
                TrackError::permission_denied("edit issue"),
                StatusCode::FORBIDDEN,
            ),
            (TrackError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (TrackError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                TrackError::validation("summary", "cannot be empty"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                TrackError::Conflict {
                    what: "username alice".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                TrackError::Storage("disk full".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError(err).into_response().status(), expected);
        }
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let response = AppError(TrackError::Storage("secret path".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
