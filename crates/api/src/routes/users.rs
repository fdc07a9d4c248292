//! User CRUD handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use rollcall_core::{PageRequest, UserId};

use crate::db::UserRepository;
use crate::error::{AppError, EMAIL_TAKEN, Result};
use crate::models::{CreateUserRequest, UpdateUserRequest, User, UserPage};
use crate::state::AppState;

const USER_NOT_FOUND: &str = "User not found";

/// `{"message": ..., "data"?: ...}` envelope for mutations.
#[derive(Debug, Serialize)]
pub struct MessageResponse<T = ()> {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl MessageResponse {
    const fn new(message: &'static str) -> Self {
        Self {
            message,
            data: None,
        }
    }
}

impl<T> MessageResponse<T> {
    const fn with_data(message: &'static str, data: T) -> Self {
        Self {
            message,
            data: Some(data),
        }
    }
}

/// Search results.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<User>,
    pub count: usize,
}

/// Raw list parameters; parsing is lenient (see [`PageRequest::from_query`]).
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

fn parse_id(raw: &str) -> Result<UserId> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid ID".to_owned()))
}

/// `POST /api/users`
///
/// # Errors
///
/// 400 on a malformed or invalid body, 409 if the email is taken, 500 on
/// store failure.
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse<User>>)> {
    let Json(request) = payload?;
    let new_user = request.validate()?;

    let users = UserRepository::new(state.pool());
    if users.email_exists(&new_user.email, None).await? {
        return Err(AppError::Conflict(EMAIL_TAKEN.to_owned()));
    }

    let user = users.create(&new_user).await?;
    tracing::info!(user_id = %user.id, "user created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_data("User created successfully", user)),
    ))
}

/// `GET /api/users?page=&limit=`
///
/// # Errors
///
/// 500 on store failure.
pub async fn list(
    State(state): State<AppState>,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<UserPage>> {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let page = PageRequest::from_query(params.page.as_deref(), params.limit.as_deref());

    let page = UserRepository::new(state.pool()).find_all(page).await?;
    Ok(Json(page))
}

/// `GET /api/users/search?q=`
///
/// # Errors
///
/// 400 if `q` is missing or empty, 500 on store failure.
pub async fn search(
    State(state): State<AppState>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>> {
    let text = params
        .ok()
        .and_then(|Query(p)| p.q)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Search parameter 'q' is required".to_owned()))?;

    let results = UserRepository::new(state.pool()).search(&text).await?;
    Ok(Json(SearchResponse {
        count: results.len(),
        results,
    }))
}

/// `GET /api/users/{id}`
///
/// # Errors
///
/// 400 on a non-integer id, 404 if absent, 500 on store failure.
pub async fn show(State(state): State<AppState>, Path(raw_id): Path<String>) -> Result<Json<User>> {
    let id = parse_id(&raw_id)?;

    UserRepository::new(state.pool())
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_owned()))
}

/// `PUT /api/users/{id}`
///
/// Loads the record first so a missing id is a 404 even for an empty
/// body, then checks a changed email against every other record.
///
/// # Errors
///
/// 400 on a bad id or body, 404 if absent, 409 if the new email is taken,
/// 500 on store failure.
pub async fn update(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: std::result::Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<MessageResponse<User>>> {
    let id = parse_id(&raw_id)?;
    let Json(request) = payload?;
    let changes = request.validate()?;

    let users = UserRepository::new(state.pool());
    let existing = users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_owned()))?;

    if let Some(email) = &changes.email
        && *email != existing.email
        && users.email_exists(email, Some(id)).await?
    {
        return Err(AppError::Conflict(EMAIL_TAKEN.to_owned()));
    }

    let user = users
        .update(id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_owned()))?;
    tracing::info!(user_id = %id, "user updated");

    Ok(Json(MessageResponse::with_data(
        "User updated successfully",
        user,
    )))
}

/// `DELETE /api/users/{id}`
///
/// # Errors
///
/// 400 on a non-integer id, 404 if absent, 500 on store failure.
pub async fn delete(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_id(&raw_id)?;

    if !UserRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound(USER_NOT_FOUND.to_owned()));
    }
    tracing::info!(user_id = %id, "user deleted");

    Ok(Json(MessageResponse::new("User deleted successfully")))
}
