use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use service::auth::{AuthError, TokenError};

const INTERNAL_MESSAGE: &str = "an internal error occurred";

/// JSON error body: `{"error": <kind>, "message": <text>}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self { status, body: ErrorBody { error: error.into(), message: message.into() } }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn route_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Route not found", "The requested endpoint does not exist")
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", INTERNAL_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let message = e.to_string();
        match e {
            AuthError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, "validation_error", message),
            AuthError::WeakPassword(_) => Self::new(StatusCode::BAD_REQUEST, "weak_password", message),
            AuthError::InvalidRole(_) => Self::new(StatusCode::BAD_REQUEST, "invalid_role", message),
            AuthError::InvalidCredentials => Self::new(StatusCode::UNAUTHORIZED, "invalid_credentials", message),
            AuthError::InvalidToken => Self::new(StatusCode::UNAUTHORIZED, "invalid_token", message),
            AuthError::UserInactive => Self::new(StatusCode::FORBIDDEN, "user_inactive", message),
            AuthError::NotFound => Self::new(StatusCode::NOT_FOUND, "not_found", message),
            AuthError::EmailExists => Self::new(StatusCode::CONFLICT, "email_exists", message),
            AuthError::ProfileMissing { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "profile_integrity_error",
                "user profile is missing; contact support",
            ),
            AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_) => {
                error!(code = e.code(), error = %message, "internal_auth_error");
                Self::internal()
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => Self::unauthorized("token expired"),
            TokenError::Malformed => Self::unauthorized("invalid token"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", e.body_text())
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::auth::password::PasswordStrengthError;
    use service::auth::Role;

    fn status_of(e: AuthError) -> StatusCode {
        ApiError::from(e).status
    }

    #[test]
    fn auth_errors_map_to_statuses() {
        assert_eq!(status_of(AuthError::WeakPassword(PasswordStrengthError::TooShort)), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AuthError::InvalidRole("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::UserInactive), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AuthError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AuthError::EmailExists), StatusCode::CONFLICT);
        assert_eq!(
            status_of(AuthError::ProfileMissing { account_id: 1, role: Role::Clinician }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let api = ApiError::from(AuthError::Repository("connection refused at 10.0.0.5".into()));
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body.error, "internal_error");
        assert!(!api.body.message.contains("10.0.0.5"));
    }

    #[test]
    fn token_errors_have_distinct_messages() {
        assert_eq!(ApiError::from(TokenError::Expired).body.message, "token expired");
        assert_eq!(ApiError::from(TokenError::Malformed).body.message, "invalid token");
    }
}
