use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::auth::Identity;
use crate::error::AppError;
use crate::state::AppState;

/// The caller behind a valid bearer token.
/// Rejects with 401 when the header is missing, malformed, or the token does not validate.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts).ok_or(AppError::Unauthorized)?;
        let identity = state.auth.validate(token).await?;
        Ok(CurrentUser(identity))
    }
}

/// A caller that must also be a superuser; 403 otherwise.
#[derive(Debug, Clone)]
pub struct Superuser(pub Identity);

impl FromRequestParts<AppState> for Superuser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(identity) = CurrentUser::from_request_parts(parts, state).await?;
        if !identity.is_superuser {
            return Err(AppError::Forbidden("Forbidden".into()));
        }
        Ok(Superuser(identity))
    }
}

fn extract_bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}
