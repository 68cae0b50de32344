use thiserror::Error;

use super::domain::Role;
use super::password::PasswordStrengthError;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("weak password: {0}")]
    WeakPassword(#[from] PasswordStrengthError),
    #[error("invalid role: {0}")]
    InvalidRole(String),
    #[error("email already registered")]
    EmailExists,
    #[error("not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user account is inactive")]
    UserInactive,
    #[error("invalid or expired refresh token")]
    InvalidToken,
    /// Account row exists without the profile row its role requires.
    #[error("profile missing for account {account_id} with role {role}")]
    ProfileMissing { account_id: i32, role: Role },
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::WeakPassword(_) => 1002,
            AuthError::InvalidRole(_) => 1003,
            AuthError::EmailExists => 1004,
            AuthError::NotFound => 1005,
            AuthError::InvalidCredentials => 1006,
            AuthError::UserInactive => 1007,
            AuthError::InvalidToken => 1008,
            AuthError::ProfileMissing { .. } => 1009,
            AuthError::HashError(_) => 1101,
            AuthError::TokenError(_) => 1102,
            AuthError::Repository(_) => 1200,
        }
    }
}

impl From<models::errors::ModelError> for AuthError {
    fn from(e: models::errors::ModelError) -> Self {
        match e {
            models::errors::ModelError::Validation(msg) => AuthError::Validation(msg),
            other => AuthError::Repository(other.to_string()),
        }
    }
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(e: sea_orm::DbErr) -> Self {
        AuthError::Repository(e.to_string())
    }
}
