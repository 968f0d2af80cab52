use serde::Deserialize;

use crate::auth::tokens::{password_fingerprint, TokenCodec, TokenPurpose};
use crate::auth::{password, AuthError};
use crate::config::AuthConfig;
use crate::db::models::UserRead;
use crate::db::users::{UpdateOutcome, UserChanges, UserStore};

/// A partial profile edit. The flags are honoured only on the superuser path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AuthError::InvalidEmail),
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::InvalidPassword("password cannot be empty".into()));
    }
    Ok(())
}

/// Account lifecycle: registration, password reset, email verification and profile edits.
#[derive(Clone)]
pub struct UserManager {
    users: UserStore,
    tokens: TokenCodec,
    bcrypt_cost: u32,
    reset_lifetime_secs: u64,
    verify_lifetime_secs: u64,
    superusers: Vec<String>,
}

impl UserManager {
    pub fn new(users: UserStore, tokens: TokenCodec, config: &AuthConfig) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost: config.bcrypt_cost,
            reset_lifetime_secs: config.reset_token_lifetime_secs,
            verify_lifetime_secs: config.verify_token_lifetime_secs,
            superusers: config.superusers.iter().map(|e| normalize_email(e)).collect(),
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<UserRead, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        let hashed = password::hash(password, self.bcrypt_cost).await?;
        let user = self
            .users
            .create(&email, &hashed)
            .await?
            .ok_or(AuthError::UserAlreadyExists)?;
        tracing::info!(user_id = %user.id, "User has registered");

        if self.superusers.contains(&user.email) {
            return self.grant_superuser(&user.id).await;
        }
        Ok(user.into())
    }

    /// Grant superuser to every configured account that already exists.
    pub async fn promote_configured_superusers(&self) -> Result<(), AuthError> {
        for email in &self.superusers {
            match self.users.by_email(email).await? {
                Some(user) if !user.is_superuser => {
                    self.grant_superuser(&user.id).await?;
                }
                Some(_) => {}
                None => tracing::debug!(%email, "Configured superuser has not registered yet"),
            }
        }
        Ok(())
    }

    async fn grant_superuser(&self, id: &str) -> Result<UserRead, AuthError> {
        let changes = UserChanges {
            is_superuser: Some(true),
            ..UserChanges::default()
        };
        let user = self.apply(id, changes).await?;
        tracing::info!(user_id = %user.id, "Granted superuser from config");
        Ok(user)
    }

    /// Issue a reset token for an active user. Unknown emails are not revealed to the caller.
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, AuthError> {
        let Some(user) = self.users.by_email(&normalize_email(email)).await? else {
            return Ok(None);
        };
        if !user.is_active {
            return Ok(None);
        }

        let token = self
            .tokens
            .issue_reset(&user.id, &user.password_hash, self.reset_lifetime_secs)?;
        // No mail delivery; the token is handed over through the log
        tracing::info!(user_id = %user.id, %token, "User requested password reset");
        Ok(Some(token))
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> Result<UserRead, AuthError> {
        let claims = self
            .tokens
            .decode(token, TokenPurpose::ResetPassword)
            .map_err(|_| AuthError::BadResetToken)?;
        let user = self
            .users
            .by_id(&claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::BadResetToken)?;
        // A token minted before the last password change is spent
        if claims.fgpt.as_deref() != Some(password_fingerprint(&user.password_hash).as_str()) {
            return Err(AuthError::BadResetToken);
        }
        validate_password(password)?;

        let changes = UserChanges {
            password_hash: Some(password::hash(password, self.bcrypt_cost).await?),
            ..UserChanges::default()
        };
        let user = match self.apply(&user.id, changes).await {
            Err(AuthError::UserNotFound) => return Err(AuthError::BadResetToken),
            other => other?,
        };

        tracing::info!(user_id = %user.id, "User has reset their password");
        Ok(user)
    }

    /// Issue a verification token for an active, unverified user.
    pub async fn request_verify(&self, email: &str) -> Result<Option<String>, AuthError> {
        let Some(user) = self.users.by_email(&normalize_email(email)).await? else {
            return Ok(None);
        };
        if !user.is_active || user.is_verified {
            return Ok(None);
        }

        let token = self.tokens.issue(
            &user.id,
            Some(&user.email),
            TokenPurpose::Verify,
            self.verify_lifetime_secs,
        )?;
        tracing::info!(user_id = %user.id, %token, "User requested verification");
        Ok(Some(token))
    }

    pub async fn verify(&self, token: &str) -> Result<UserRead, AuthError> {
        let claims = self
            .tokens
            .decode(token, TokenPurpose::Verify)
            .map_err(|_| AuthError::BadVerifyToken)?;
        let user = self
            .users
            .by_id(&claims.sub)
            .await?
            .ok_or(AuthError::BadVerifyToken)?;

        // A token minted for an old address does not verify the new one
        if claims.email.as_deref() != Some(user.email.as_str()) {
            return Err(AuthError::BadVerifyToken);
        }
        if user.is_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let changes = UserChanges {
            is_verified: Some(true),
            ..UserChanges::default()
        };
        let user = match self.apply(&user.id, changes).await {
            Err(AuthError::UserNotFound) => return Err(AuthError::BadVerifyToken),
            other => other?,
        };
        tracing::info!(user_id = %user.id, "User has been verified");
        Ok(user)
    }

    pub async fn get(&self, id: &str) -> Result<Option<UserRead>, AuthError> {
        Ok(self.users.by_id(id).await?.map(UserRead::from))
    }

    /// Self-service edit: only email and password change.
    pub async fn update(&self, id: &str, update: UserUpdate) -> Result<UserRead, AuthError> {
        let update = UserUpdate {
            is_active: None,
            is_superuser: None,
            is_verified: None,
            ..update
        };
        self.update_as_admin(id, update).await
    }

    /// Superuser edit: any field, including the account flags.
    pub async fn update_as_admin(
        &self,
        id: &str,
        update: UserUpdate,
    ) -> Result<UserRead, AuthError> {
        let email = match update.email {
            Some(email) => {
                let email = normalize_email(&email);
                validate_email(&email)?;
                Some(email)
            }
            None => None,
        };
        let password_hash = match update.password {
            Some(pw) => {
                validate_password(&pw)?;
                Some(password::hash(&pw, self.bcrypt_cost).await?)
            }
            None => None,
        };

        let changes = UserChanges {
            email,
            password_hash,
            is_active: update.is_active,
            is_superuser: update.is_superuser,
            is_verified: update.is_verified,
        };
        let user = self.apply(id, changes).await?;
        tracing::info!(
            user_id = %user.id,
            is_active = user.is_active,
            is_superuser = user.is_superuser,
            "User updated"
        );
        Ok(user)
    }

    async fn apply(&self, id: &str, changes: UserChanges) -> Result<UserRead, AuthError> {
        match self.users.update(id, changes).await? {
            UpdateOutcome::Updated(user) => Ok(user.into()),
            UpdateOutcome::NotFound => Err(AuthError::UserNotFound),
            UpdateOutcome::EmailTaken => Err(AuthError::EmailTaken),
        }
    }

    pub async fn delete(&self, id: &str) -> Result<bool, AuthError> {
        let removed = self.users.delete(id).await?;
        if removed {
            tracing::info!(user_id = %id, "User deleted");
        }
        Ok(removed)
    }
}
