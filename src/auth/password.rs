//! Password hashing and verification using Argon2id

use crate::{config::SecurityConfig, error::AppError};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Password hasher with configurable parameters
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    // Same cost parameters as real hashes; used when the account does not exist
    decoy_hash: Option<String>,
}

impl PasswordHasher {
    /// m=64MiB, t=3, p=4
    pub fn new() -> Self {
        Self::with_params(Params::new(65536, 3, 4, None))
    }

    /// Minimal cost parameters for tests and local demos
    pub fn fast() -> Self {
        Self::with_params(Params::new(Params::MIN_M_COST, 1, 1, None))
    }

    fn with_params(params: Result<Params, argon2::Error>) -> Self {
        let params = params.unwrap_or_default();
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let decoy_hash = argon2
            .hash_password(b"visiontrack-decoy", &salt)
            .map(|hash| hash.to_string())
            .ok();

        Self { argon2, decoy_hash }
    }

    /// Hash a password
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {:?}", e);
                AppError::Internal(format!("Failed to hash password: {}", e))
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a hash
    pub fn verify(&self, password: &str, hash: &str) -> Result<(), AppError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::debug!("Failed to parse password hash: {:?}", e);
            AppError::Internal(format!("Failed to parse password hash: {}", e))
        })?;

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::Unauthorized)
    }

    /// Spend the cost of one verification without a stored hash.
    ///
    /// Login calls this for unknown emails so response time does not reveal
    /// whether an account exists.
    pub fn verify_decoy(&self, password: &str) {
        if let Some(hash) = &self.decoy_hash {
            let _ = self.verify(password, hash);
        }
    }

    /// Validate password against policy
    pub fn validate_password_policy(password: &str, policy: &SecurityConfig) -> Result<(), AppError> {
        if password.chars().count() < policy.password_min_length {
            return Err(AppError::Validation(format!(
                "password: must be at least {} characters",
                policy.password_min_length
            )));
        }

        if policy.password_require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            return Err(AppError::validation(
                "password: must contain at least one uppercase letter",
            ));
        }

        if policy.password_require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::validation("password: must contain at least one digit"));
        }

        Ok(())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
