// Password hashing and verification

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

use crate::auth::error::AuthError;

/// Argon2id password hasher
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

impl PasswordService {
    /// Hasher with explicit cost parameters
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hash a password with a fresh random salt, returning a PHC string
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswordHashError(e.to_string()))
    }

    /// Verify a password against a stored hash.
    /// A malformed hash verifies as false.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash could not be parsed: {}", e);
                false
            }
        }
    }

    /// `hash_password` on the blocking pool, off the async workers
    pub async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let service = self.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || service.hash_password(&password))
            .await
            .map_err(|e| AuthError::PasswordHashError(e.to_string()))?
    }

    /// `verify_password` on the blocking pool, off the async workers
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let service = self.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || service.verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::PasswordHashError(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) fn fast_password_service() -> PasswordService {
    // Minimum cost; only for tests
    let params = Params::new(Params::MIN_M_COST, 1, 1, None).expect("valid argon2 params");
    PasswordService::with_params(params)
}
