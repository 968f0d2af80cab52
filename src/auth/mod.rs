pub mod handlers;
pub mod manager;
pub mod password;
pub mod tokens;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::db::models::User;
use crate::db::users::UserStore;
use crate::db::DbError;

pub use manager::{UserManager, UserUpdate};
pub use tokens::{TokenCodec, TokenPurpose};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("user is inactive")]
    Inactive,

    #[error("a user with this email already exists")]
    UserAlreadyExists,

    #[error("invalid email address")]
    InvalidEmail,

    #[error("invalid password: {0}")]
    InvalidPassword(String),

    #[error("bad reset token")]
    BadResetToken,

    #[error("bad verification token")]
    BadVerifyToken,

    #[error("user is already verified")]
    AlreadyVerified,

    #[error("email already in use")]
    EmailTaken,

    #[error("user not found")]
    UserNotFound,

    #[error("hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("store error: {0}")]
    Store(#[from] DbError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Internal(String),
}

/// Who a validated bearer token belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub is_superuser: bool,
    pub is_verified: bool,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            is_superuser: user.is_superuser,
            is_verified: user.is_verified,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    /// The account email; named `username` to match the OAuth2 password form
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

impl AccessToken {
    pub fn bearer(token: String) -> Self {
        Self {
            access_token: token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Issues and checks bearer tokens.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, AuthError>;

    async fn validate(&self, token: &str) -> Result<Identity, AuthError>;
}

pub type DynAuthService = Arc<dyn AuthService>;

/// Bearer tokens as signed JWTs over the local user table.
pub struct JwtAuthService {
    users: UserStore,
    tokens: TokenCodec,
    lifetime_secs: u64,
}

impl JwtAuthService {
    pub fn new(users: UserStore, tokens: TokenCodec, lifetime_secs: u64) -> Self {
        Self {
            users,
            tokens,
            lifetime_secs,
        }
    }
}

#[async_trait]
impl AuthService for JwtAuthService {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, AuthError> {
        let email = manager::normalize_email(&credentials.username);
        let user = self
            .users
            .by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify(&credentials.password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(&user.id, None, TokenPurpose::Access, self.lifetime_secs)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(AccessToken::bearer(token))
    }

    async fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.tokens.decode(token, TokenPurpose::Access)?;
        let user = self
            .users
            .by_id(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.is_active {
            return Err(AuthError::Inactive);
        }
        Ok(Identity::from(&user))
    }
}
