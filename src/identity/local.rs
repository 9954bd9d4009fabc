use async_trait::async_trait;
use chrono::Utc;

use super::password::{hash_password, verify_password};
use super::{generate_token, token_digest, AuthTokens, IdentityError, IdentityProvider, UserHandle};
use crate::storage::models::{SessionRecord, UserRecord};
use crate::storage::{Database, SignUpOutcome};

/// Self-contained provider backed by the metadata database.
///
/// Confirmation codes are not verified: any code confirms an existing user.
pub struct LocalIdentity {
    db: Database,
    password_hash_iterations: u32,
}

impl LocalIdentity {
    pub fn new(db: Database, password_hash_iterations: u32) -> Self {
        Self {
            db,
            password_hash_iterations,
        }
    }
}

fn to_handle(user: &UserRecord) -> UserHandle {
    UserHandle {
        id: user.id.clone(),
        username: user.username.clone(),
        email: Some(user.email.clone()),
        confirmed: user.confirmed,
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, IdentityError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, IdentityError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| IdentityError::Backend(format!("password task failed: {e}")))?
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn sign_up(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<UserHandle, IdentityError> {
        let iterations = self.password_hash_iterations;
        let plain = password.to_string();
        let password_hash = run_blocking(move || hash_password(&plain, iterations)).await?;

        let user = UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash,
            email: email.to_string(),
            confirmed: false,
            created_at: Utc::now(),
        };

        match self.db.create_user(&user)? {
            SignUpOutcome::Created(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "User signed up");
                Ok(to_handle(&user))
            }
            SignUpOutcome::UsernameTaken => Err(IdentityError::AlreadyExists(
                "user already exists".to_string(),
            )),
            SignUpOutcome::EmailTaken => Err(IdentityError::AlreadyExists(
                "email already exists".to_string(),
            )),
        }
    }

    async fn confirm_sign_up(&self, username: &str, _code: &str) -> Result<(), IdentityError> {
        if !self.db.confirm_user(username)? {
            return Err(IdentityError::NotFound("user not found".to_string()));
        }
        tracing::info!(username = %username, "User confirmed");
        Ok(())
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<AuthTokens, IdentityError> {
        let user = self
            .db
            .get_user_by_username(username)?
            .ok_or_else(|| IdentityError::Unauthenticated("invalid username or password".into()))?;

        let plain = password.to_string();
        let encoded = user.password_hash.clone();
        let matches = run_blocking(move || Ok(verify_password(&plain, &encoded))).await?;
        if !matches {
            return Err(IdentityError::Unauthenticated(
                "invalid username or password".into(),
            ));
        }

        if !user.confirmed {
            return Err(IdentityError::Unauthenticated("user not confirmed".into()));
        }

        let token = generate_token()?;
        self.db.put_session(
            &token_digest(&token),
            &SessionRecord {
                user_id: user.id.clone(),
                created_at: Utc::now(),
            },
        )?;

        tracing::debug!(user_id = %user.id, "Issued access token");
        Ok(AuthTokens {
            access_token: token.clone(),
            id_token: token,
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<UserHandle, IdentityError> {
        if access_token.is_empty() {
            return Err(IdentityError::Unauthenticated("invalid token".into()));
        }

        let session = self
            .db
            .get_session(&token_digest(access_token))?
            .ok_or_else(|| IdentityError::Unauthenticated("invalid token".into()))?;

        let user = self
            .db
            .get_user(&session.user_id)?
            .ok_or_else(|| IdentityError::Unauthenticated("invalid token".into()))?;

        Ok(to_handle(&user))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        if self.db.delete_session(&token_digest(access_token))? {
            tracing::debug!("Revoked access token");
        }
        Ok(())
    }
}
