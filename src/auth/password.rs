use crate::auth::AuthError;

/// Hash a password with bcrypt on the blocking pool.
pub async fn hash(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed)
}

/// Constant-time check of a password against a stored bcrypt hash.
/// A malformed hash never verifies.
pub async fn verify(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await?;
    Ok(ok)
}
