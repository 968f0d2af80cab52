use axum::extract::State;
use axum::http::StatusCode;
use axum::{Form, Json};
use serde::Deserialize;

use crate::auth::{AccessToken, Credentials};
use crate::db::models::UserRead;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

// -- Handlers --

/// POST /auth/jwt/login: OAuth2 password form, `username` is the email
pub async fn login(
    State(state): State<AppState>,
    Form(credentials): Form<Credentials>,
) -> AppResult<Json<AccessToken>> {
    let token = state.auth.authenticate(&credentials).await?;
    Ok(Json(token))
}

/// POST /auth/jwt/logout: tokens are stateless, so this only confirms the caller
pub async fn logout(CurrentUser(user): CurrentUser) -> StatusCode {
    tracing::info!(user_id = %user.id, "User logged out");
    StatusCode::NO_CONTENT
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserRead>)> {
    let user = state.users.register(&req.email, &req.password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/forgot-password: always 202 whether or not the email is registered
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> AppResult<StatusCode> {
    state.users.forgot_password(&req.email).await?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    state.users.reset_password(&req.token, &req.password).await?;
    Ok(StatusCode::OK)
}

/// POST /auth/request-verify-token: always 202
pub async fn request_verify_token(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> AppResult<StatusCode> {
    state.users.request_verify(&req.email).await?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /auth/verify
pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> AppResult<Json<UserRead>> {
    let user = state.users.verify(&req.token).await?;
    Ok(Json(user))
}
