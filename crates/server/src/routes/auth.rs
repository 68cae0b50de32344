use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use tracing::warn;

use common::types::MessageResponse;
use service::auth::{
    AccessClaims, AuthRepository, AuthService, AuthSession, ChangePasswordInput, LoginInput, RefreshInput,
    RegisterInput, UserProfile,
};

use crate::errors::ApiError;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService<dyn AuthRepository>>,
}

impl ServerState {
    pub fn new(auth: Arc<AuthService<dyn AuthRepository>>) -> Self {
        Self { auth }
    }
}

#[utoipa::path(post, path = "/api/v1/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest,
    responses((status = 201, description = "Registered", body = crate::openapi::SessionResponse), (status = 400, description = "Validation, weak password or role error", body = crate::openapi::ErrorResponse), (status = 409, description = "Email already registered", body = crate::openapi::ErrorResponse)))]
pub async fn register(
    State(state): State<ServerState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthSession>), ApiError> {
    let Json(input) = payload?;
    let session = state.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(post, path = "/api/v1/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest,
    responses((status = 200, description = "Logged in", body = crate::openapi::SessionResponse), (status = 401, description = "Invalid credentials", body = crate::openapi::ErrorResponse), (status = 403, description = "Account inactive", body = crate::openapi::ErrorResponse), (status = 500, description = "Profile integrity fault", body = crate::openapi::ErrorResponse)))]
pub async fn login(
    State(state): State<ServerState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<AuthSession>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(state.auth.login(input).await?))
}

#[utoipa::path(post, path = "/api/v1/auth/refresh", tag = "auth", request_body = crate::openapi::RefreshRequest,
    responses((status = 200, description = "New token pair", body = crate::openapi::SessionResponse), (status = 401, description = "Invalid, expired or revoked refresh token", body = crate::openapi::ErrorResponse)))]
pub async fn refresh(
    State(state): State<ServerState>,
    payload: Result<Json<RefreshInput>, JsonRejection>,
) -> Result<Json<AuthSession>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(state.auth.refresh_token(input).await?))
}

#[utoipa::path(post, path = "/api/v1/auth/logout", tag = "auth",
    responses((status = 200, description = "Refresh tokens revoked", body = crate::openapi::MessageResponseDoc), (status = 401, description = "Unauthenticated", body = crate::openapi::ErrorResponse)))]
pub async fn logout(
    State(state): State<ServerState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth.logout(claims.user_id).await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

#[utoipa::path(get, path = "/api/v1/auth/profile", tag = "auth",
    responses((status = 200, description = "Account with role profile"), (status = 401, description = "Unauthenticated", body = crate::openapi::ErrorResponse), (status = 404, description = "Account not found", body = crate::openapi::ErrorResponse)))]
pub async fn profile(
    State(state): State<ServerState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.auth.get_profile(claims.user_id).await?))
}

#[utoipa::path(post, path = "/api/v1/auth/change-password", tag = "auth", request_body = crate::openapi::ChangePasswordRequest,
    responses((status = 200, description = "Password changed", body = crate::openapi::MessageResponseDoc), (status = 400, description = "Weak new password", body = crate::openapi::ErrorResponse), (status = 401, description = "Wrong current password", body = crate::openapi::ErrorResponse)))]
pub async fn change_password(
    State(state): State<ServerState>,
    Extension(claims): Extension<AccessClaims>,
    payload: Result<Json<ChangePasswordInput>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(input) = payload?;
    state.auth.change_password(claims.user_id, input).await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// Verify `Authorization: Bearer <token>` and hand the claims to the handler
/// through request extensions.
pub async fn require_bearer(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            warn!(%path, "missing bearer token");
            ApiError::unauthorized("missing bearer token")
        })?;

    let claims = state.auth.authenticate(token).map_err(|e| {
        warn!(%path, error = %e, "token validation failed");
        ApiError::from(e)
    })?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
