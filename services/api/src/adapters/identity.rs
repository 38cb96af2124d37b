//! services/api/src/adapters/identity.rs
//!
//! Password-based identity provider. Implements the `IdentityService` port on top of
//! the users and auth-session tables exposed by `DatabaseService`.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use flashcards_core::domain::{AuthSession, User};
use flashcards_core::ports::{DatabaseService, IdentityService, PortError, PortResult};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// How long a login cookie stays valid.
pub const SESSION_LIFETIME_DAYS: i64 = 30;

#[derive(Clone)]
pub struct PasswordIdentityAdapter {
    db: Arc<dyn DatabaseService>,
}

impl PasswordIdentityAdapter {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    async fn open_session(&self, user_id: Uuid) -> PortResult<AuthSession> {
        let session = AuthSession {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: Utc::now() + Duration::days(SESSION_LIFETIME_DAYS),
        };
        self.db
            .create_auth_session(&session.id, session.user_id, session.expires_at)
            .await?;
        Ok(session)
    }
}

fn hash_password(password: &str) -> PortResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            PortError::Unexpected("Failed to hash password".to_string())
        })
}

fn verify_password(password: &str, stored_hash: &str) -> PortResult<bool> {
    let parsed_hash = PasswordHash::new(stored_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        PortError::Unexpected("Authentication error".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[async_trait]
impl IdentityService for PasswordIdentityAdapter {
    async fn sign_up(&self, email: &str, password: &str) -> PortResult<(User, AuthSession)> {
        let password_hash = hash_password(password)?;
        let user = self.db.create_user_with_email(email, &password_hash).await?;
        let session = self.open_session(user.user_id).await?;
        Ok((user, session))
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<(User, AuthSession)> {
        // Unknown email and wrong password look the same to the caller.
        let creds = match self.db.get_user_by_email(email).await {
            Ok(creds) => creds,
            Err(PortError::NotFound(_)) => return Err(PortError::Unauthorized),
            Err(e) => return Err(e),
        };
        if !verify_password(password, &creds.hashed_password)? {
            return Err(PortError::Unauthorized);
        }
        let session = self.open_session(creds.user_id).await?;
        let user = User {
            user_id: creds.user_id,
            email: creds.email,
        };
        Ok((user, session))
    }

    async fn sign_out(&self, session_id: &str) -> PortResult<()> {
        self.db.delete_auth_session(session_id).await
    }

    async fn current_user(&self, session_id: &str) -> PortResult<Uuid> {
        self.db.validate_auth_session(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("letters123").unwrap();
        assert_ne!(hash, "letters123");
        assert!(verify_password("letters123", &hash).unwrap());
        assert!(!verify_password("letters124", &hash).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
