use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::AuthError;
use crate::db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("File upload failed: {0}")]
    UploadFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            AppError::UploadFailed(msg) => {
                tracing::error!("Upload failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("File upload failed: {}", msg),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken | AuthError::Inactive => AppError::Unauthorized,
            AuthError::InvalidCredentials => AppError::BadRequest("LOGIN_BAD_CREDENTIALS".into()),
            AuthError::UserAlreadyExists => {
                AppError::BadRequest("REGISTER_USER_ALREADY_EXISTS".into())
            }
            AuthError::InvalidEmail => AppError::Unprocessable("Invalid email address".into()),
            AuthError::InvalidPassword(reason) => AppError::BadRequest(reason),
            AuthError::BadResetToken => AppError::BadRequest("RESET_PASSWORD_BAD_TOKEN".into()),
            AuthError::BadVerifyToken => AppError::BadRequest("VERIFY_USER_BAD_TOKEN".into()),
            AuthError::AlreadyVerified => {
                AppError::BadRequest("VERIFY_USER_ALREADY_VERIFIED".into())
            }
            AuthError::EmailTaken => {
                AppError::BadRequest("UPDATE_USER_EMAIL_ALREADY_EXISTS".into())
            }
            AuthError::UserNotFound => AppError::NotFound("User not found".into()),
            AuthError::Store(e) => AppError::Database(e),
            other => AppError::Internal(other.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
