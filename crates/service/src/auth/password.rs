//! Argon2id password hashing.
//!
//! Hashes are self-describing PHC strings, so parameters and salt travel with
//! the digest. Hashing is CPU-bound; async callers go through [`hash_blocking`]
//! and [`verify_blocking`], which run on tokio's blocking pool.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use thiserror::Error;

use super::errors::AuthError;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 100;

// Stand-in hash so unknown accounts pay the same verify cost as known ones.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("unknown-account-placeholder").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasswordStrengthError {
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    TooShort,
    #[error("password must be at most {MAX_PASSWORD_LEN} characters")]
    TooLong,
}

/// Length pre-check. Counts bytes, not characters.
pub fn check_strength(plaintext: &str) -> Result<(), PasswordStrengthError> {
    match plaintext.len() {
        n if n < MIN_PASSWORD_LEN => Err(PasswordStrengthError::TooShort),
        n if n > MAX_PASSWORD_LEN => Err(PasswordStrengthError::TooLong),
        _ => Ok(()),
    }
}

pub fn hash_password(plaintext: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

/// `Ok(false)` on mismatch. Only an unparseable stored hash is an error.
pub fn verify_password(plaintext: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(plaintext.as_bytes(), &parsed).is_ok())
}

pub async fn hash_blocking(plaintext: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&plaintext))
        .await
        .map_err(|e| AuthError::HashError(e.to_string()))?
}

pub async fn verify_blocking(plaintext: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&plaintext, &hash))
        .await
        .map_err(|e| AuthError::HashError(e.to_string()))?
}

/// Burn one verification against a throwaway hash. Used when the account
/// does not exist so the response time does not reveal that.
pub async fn verify_dummy(plaintext: String) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || {
        if let Some(hash) = DUMMY_HASH.as_deref() {
            let _ = verify_password(&plaintext, hash);
        }
    })
    .await
    .map_err(|e| AuthError::HashError(e.to_string()))
}
