//! Credential/user store behind a provider trait.
//!
//! Two providers implement the same contract: [`LocalIdentity`] keeps users and
//! sessions in the metadata database, [`CognitoIdentity`] delegates everything
//! to a managed user pool.

mod cognito;
mod local;
pub mod password;

pub use cognito::CognitoIdentity;
pub use local::LocalIdentity;

use async_trait::async_trait;
use base64::Engine;
use ring::rand::SecureRandom;
use serde::Serialize;
use thiserror::Error;

use crate::storage::DatabaseError;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("Identity backend error: {0}")]
    Backend(String),
}

impl From<DatabaseError> for IdentityError {
    fn from(e: DatabaseError) -> Self {
        IdentityError::Backend(e.to_string())
    }
}

/// The authenticated user as seen by request handlers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserHandle {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub confirmed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthTokens {
    pub access_token: String,
    pub id_token: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<UserHandle, IdentityError>;

    async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<(), IdentityError>;

    async fn sign_in(&self, username: &str, password: &str) -> Result<AuthTokens, IdentityError>;

    /// Resolve an access token to its user
    async fn get_user(&self, access_token: &str) -> Result<UserHandle, IdentityError>;

    /// Best-effort revocation of an access token
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;
}

/// 32 random bytes, URL-safe base64 without padding.
pub fn generate_token() -> Result<String, IdentityError> {
    let mut bytes = [0u8; 32];
    ring::rand::SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| IdentityError::Backend("system random source unavailable".into()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Sessions are stored under the SHA-256 digest of the token, never the token itself.
pub fn token_digest(token: &str) -> String {
    let digest = ring::digest::digest(&ring::digest::SHA256, token.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique_and_url_safe() {
        let a = generate_token().unwrap();
        let b = generate_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_token_digest_is_stable() {
        assert_eq!(token_digest("abc"), token_digest("abc"));
        assert_ne!(token_digest("abc"), token_digest("abd"));
        assert_ne!(token_digest("abc"), "abc");
    }
}
