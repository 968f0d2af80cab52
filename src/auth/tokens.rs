use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::auth::AuthError;

/// What a token may be used for. Each purpose signs with its own audience,
/// so a reset token can never be presented as a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    Access,
    ResetPassword,
    Verify,
}

impl TokenPurpose {
    fn audience(self) -> &'static str {
        match self {
            TokenPurpose::Access => "snapfeed:auth",
            TokenPurpose::ResetPassword => "snapfeed:reset",
            TokenPurpose::Verify => "snapfeed:verify",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Fingerprint of the password hash a reset token was minted against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fgpt: Option<String>,
}

/// SHA-256 of a stored password hash, hex encoded. Changes whenever the password does.
pub fn password_fingerprint(password_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password_hash.as_bytes());
    hex::encode(hasher.finalize())
}

impl Claims {
    fn new(subject: &str, purpose: TokenPurpose, lifetime_secs: u64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: subject.to_string(),
            aud: purpose.audience().to_string(),
            iat: now,
            exp: now + lifetime_secs as i64,
            email: None,
            fgpt: None,
        }
    }
}

/// HS256 signer and verifier for all token purposes.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(
        &self,
        subject: &str,
        email: Option<&str>,
        purpose: TokenPurpose,
        lifetime_secs: u64,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            email: email.map(str::to_string),
            ..Claims::new(subject, purpose, lifetime_secs)
        };
        self.sign(&claims)
    }

    /// A reset token bound to the current password hash, so it stops working once used.
    pub fn issue_reset(
        &self,
        subject: &str,
        password_hash: &str,
        lifetime_secs: u64,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            fgpt: Some(password_fingerprint(password_hash)),
            ..Claims::new(subject, TokenPurpose::ResetPassword, lifetime_secs)
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("token encoding failed: {e}")))
    }

    pub fn decode(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[purpose.audience()]);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, ?purpose, "Rejected token");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn issued_token_decodes_with_same_purpose() {
        let codec = TokenCodec::new(SECRET);
        let token = codec
            .issue("user-1", None, TokenPurpose::Access, 60)
            .unwrap();
        let claims = codec.decode(&token, TokenPurpose::Access).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.aud, "snapfeed:auth");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn purposes_are_not_interchangeable() {
        let codec = TokenCodec::new(SECRET);
        let token = codec
            .issue("user-1", None, TokenPurpose::ResetPassword, 60)
            .unwrap();
        assert!(codec.decode(&token, TokenPurpose::Access).is_err());
        assert!(codec.decode(&token, TokenPurpose::ResetPassword).is_ok());
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = TokenCodec::new(SECRET)
            .issue("user-1", None, TokenPurpose::Access, 60)
            .unwrap();
        let other = TokenCodec::new("fedcba9876543210fedcba9876543210");
        assert!(matches!(
            other.decode(&token, TokenPurpose::Access),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".into(),
            aud: "snapfeed:auth".into(),
            iat: now - 7200,
            exp: now - 3600,
            email: None,
            fgpt: None,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &codec.encoding).unwrap();
        assert!(codec.decode(&token, TokenPurpose::Access).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        assert!(codec.decode("not.a.jwt", TokenPurpose::Access).is_err());
    }

    #[test]
    fn verify_token_carries_email() {
        let codec = TokenCodec::new(SECRET);
        let token = codec
            .issue("user-1", Some("a@example.com"), TokenPurpose::Verify, 60)
            .unwrap();
        let claims = codec.decode(&token, TokenPurpose::Verify).unwrap();
        assert_eq!(claims.email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn reset_token_carries_password_fingerprint() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue_reset("user-1", "$2b$04$hash", 60).unwrap();
        let claims = codec.decode(&token, TokenPurpose::ResetPassword).unwrap();
        assert_eq!(claims.fgpt, Some(password_fingerprint("$2b$04$hash")));
        assert_ne!(claims.fgpt, Some(password_fingerprint("$2b$04$other")));
    }
}
