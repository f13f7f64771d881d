//! Route handlers.
//!
//! Each handler locks the store once, does its work, and returns before
//! any await point while holding the lock.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use track_core::authz;
use track_core::error::TrackError;
use track_core::model::{Issue, NewIssue, NewUser, User};
use track_core::query::{IssueListing, IssueUpdate, Report};
use track_core::validation::SignupValidator;

use crate::auth::{SESSION_COOKIE, password, sessions};
use crate::http::dto::{LoginRequest, SignupRequest};
use crate::http::{AppError, AppState, CurrentUser};

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn signup(
    State(state): State<AppState>,
    Json(form): Json<SignupRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    SignupValidator::validate(&form.username, &form.email, &form.password)
        .map_err(TrackError::from_validation_errors)?;
    let password_hash = password::hash_password(&form.password).map_err(TrackError::from)?;

    let mut store = state.store()?;
    let user = store.create_user(&NewUser {
        username: form.username,
        email: form.email,
        password_hash,
        first_name: form.first_name,
        last_name: form.last_name,
    })?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let mut store = state.store()?;
    let (user, token) = sessions::login(&mut store, &form.username, &form.password)?;
    drop(store);

    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    Ok(([(header::SET_COOKIE, cookie)], Json(user)).into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    let mut store = state.store()?;
    sessions::logout(&mut store, &current.token)?;
    drop(store);

    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0");
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)], ()).into_response())
}

/// Issue listing, scoped by the requester's role and team. The full
/// status set rides along for the UI's client-side filter.
pub async fn list_issues(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<IssueListing>, AppError> {
    let store = state.store()?;
    let team = store.get_user_team(&current.user)?;
    let scope = authz::list_scope(&current.user, team.as_ref());
    let issues = store.list_issues(&scope)?;
    let statuses = store.list_statuses()?;
    Ok(Json(IssueListing { issues, statuses }))
}

pub async fn issue_detail(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Issue>, AppError> {
    let store = state.store()?;
    Ok(Json(store.get_issue(id)?))
}

pub async fn create_issue(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(form): Json<NewIssue>,
) -> Result<(StatusCode, Json<Issue>), AppError> {
    authz::require_create_issue(&current.user)?;
    let mut store = state.store()?;
    let issue = store.create_issue(&form, current.user.id)?;
    Ok((StatusCode::CREATED, Json(issue)))
}

pub async fn edit_issue(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(update): Json<IssueUpdate>,
) -> Result<Json<Issue>, AppError> {
    let mut store = state.store()?;
    let issue = store.get_issue(id)?;
    authz::require_edit_issue(&current.user, &issue)?;
    Ok(Json(store.update_issue(id, &update)?))
}

pub async fn delete_issue(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let mut store = state.store()?;
    let issue = store.get_issue(id)?;
    authz::require_delete_issue(&current.user, &issue)?;
    store.delete_issue(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn report(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Report>, AppError> {
    authz::require_view_report(&current.user)?;
    let store = state.store()?;
    Ok(Json(store.report()?))
}
