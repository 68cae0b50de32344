use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String, pub timestamp: String }

#[derive(ToSchema)]
pub struct ErrorResponse { pub error: String, pub message: String }

#[derive(ToSchema)]
pub struct MessageResponseDoc { pub message: String }

#[derive(utoipa::ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    /// 6 to 100 bytes
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// `clinician` or `patient`
    pub role: String,
}

#[derive(utoipa::ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(utoipa::ToSchema)]
pub struct RefreshRequest { pub refresh_token: String }

#[derive(utoipa::ToSchema)]
pub struct ChangePasswordRequest { pub old_password: String, pub new_password: String }

#[derive(utoipa::ToSchema)]
pub struct UserDoc {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(utoipa::ToSchema)]
pub struct SessionResponse {
    pub user: UserDoc,
    /// Access token, 24h
    pub token: String,
    /// Refresh token, 7d, single use
    pub refresh_token: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::refresh,
        crate::routes::auth::logout,
        crate::routes::auth::profile,
        crate::routes::auth::change_password,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            MessageResponseDoc,
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            ChangePasswordRequest,
            UserDoc,
            SessionResponse,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth")
    )
)]
pub struct ApiDoc;
