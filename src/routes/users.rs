use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::auth::UserUpdate;
use crate::db::models::UserRead;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Superuser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(me).patch(update_me))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<UserRead>> {
    let user = state.users.get(&user.id).await?.ok_or(AppError::Unauthorized)?;
    Ok(Json(user))
}

async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<UserUpdate>,
) -> AppResult<Json<UserRead>> {
    let user = state.users.update(&user.id, update).await?;
    Ok(Json(user))
}

async fn get_user(
    State(state): State<AppState>,
    Superuser(_admin): Superuser,
    Path(id): Path<String>,
) -> AppResult<Json<UserRead>> {
    let user = state
        .users
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(user))
}

/// Superusers may change any field, including `is_active`, `is_superuser` and `is_verified`.
async fn update_user(
    State(state): State<AppState>,
    Superuser(admin): Superuser,
    Path(id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> AppResult<Json<UserRead>> {
    let user = state.users.update_as_admin(&id, update).await?;
    tracing::info!(user_id = %user.id, admin_id = %admin.id, "User changed by superuser");
    Ok(Json(user))
}

/// Removing a user leaves their posts in the feed without an owner.
async fn delete_user(
    State(state): State<AppState>,
    Superuser(_admin): Superuser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if state.users.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("User not found".into()))
    }
}
