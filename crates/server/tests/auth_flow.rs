use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use server::routes::{self, ServerState};
use service::auth::repository::mock::MockAuthRepository;
use service::auth::{AuthRepository, AuthService, SigningSecret, TokenIssuer};

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

fn build_app() -> (Arc<MockAuthRepository>, Router) {
    let mock = Arc::new(MockAuthRepository::default());
    let repo: Arc<dyn AuthRepository> = mock.clone();
    let tokens = TokenIssuer::new(SigningSecret::new("integration-test-secret").unwrap());
    let state = ServerState::new(Arc::new(AuthService::new(repo, tokens)));
    (mock, routes::build_router(state, cors()))
}

async fn send(app: &Router, method: &str, uri: &str, bearer: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(v) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&v).unwrap()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn register_body(email: &str, password: &str, role: &str) -> Value {
    json!({"email": email, "password": password, "first_name": "A", "last_name": "B", "role": role})
}

#[tokio::test]
async fn register_login_change_password_refresh_scenario() {
    let (_, app) = build_app();

    let (status, reg) = send(&app, "POST", "/api/v1/auth/register", None, Some(register_body("a@x.com", "secret1", "patient"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reg["user"]["first_name"], "A");
    assert_eq!(reg["user"]["role"], "patient");
    assert!(reg["user"].get("password_hash").is_none());
    let account_id = reg["user"]["id"].clone();

    let (status, login) = send(&app, "POST", "/api/v1/auth/login", None, Some(json!({"email": "a@x.com", "password": "secret1"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["user"]["id"], account_id);
    let token = login["token"].as_str().unwrap().to_string();

    let (status, err) = send(&app, "POST", "/api/v1/auth/login", None, Some(json!({"email": "a@x.com", "password": "wrong"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["error"], "invalid_credentials");

    let (status, err) = send(
        &app,
        "POST",
        "/api/v1/auth/change-password",
        Some(token.as_str()),
        Some(json!({"old_password": "secret1", "new_password": "short"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "weak_password");

    let (status, _) = send(&app, "POST", "/api/v1/auth/logout", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, err) = send(&app, "POST", "/api/v1/auth/refresh", None, Some(json!({"refresh_token": login["refresh_token"]}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["error"], "invalid_token");

    // access token outlives logout
    let (status, profile) = send(&app, "GET", "/api/v1/auth/profile", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "a@x.com");
}

#[tokio::test]
async fn refresh_rotation_rejects_replay() {
    let (_, app) = build_app();
    let (_, reg) = send(&app, "POST", "/api/v1/auth/register", None, Some(register_body("r@x.com", "secret1", "clinician"))).await;
    let body = json!({"refresh_token": reg["refresh_token"]});

    let (status, rotated) = send(&app, "POST", "/api/v1/auth/refresh", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refresh_token"], reg["refresh_token"]);
    assert_eq!(rotated["user"]["profile"]["department"], "General Medicine");

    let (status, _) = send(&app, "POST", "/api/v1/auth/refresh", None, Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_error_statuses() {
    let (_, app) = build_app();
    let (status, _) = send(&app, "POST", "/api/v1/auth/register", None, Some(register_body("d@x.com", "secret1", "patient"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = send(&app, "POST", "/api/v1/auth/register", None, Some(register_body("d@x.com", "secret1", "patient"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "email_exists");

    let (status, err) = send(&app, "POST", "/api/v1/auth/register", None, Some(register_body("e@x.com", "secret1", "admin"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_role");

    let (status, _) = send(&app, "POST", "/api/v1/auth/register", None, Some(json!({"email": "f@x.com"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn inactive_and_orphaned_accounts() {
    let (repo, app) = build_app();
    let (_, a) = send(&app, "POST", "/api/v1/auth/register", None, Some(register_body("i@x.com", "secret1", "patient"))).await;
    let (_, b) = send(&app, "POST", "/api/v1/auth/register", None, Some(register_body("o@x.com", "secret1", "patient"))).await;

    repo.set_active(a["user"]["id"].as_i64().unwrap() as i32, false);
    let (status, _) = send(&app, "POST", "/api/v1/auth/login", None, Some(json!({"email": "i@x.com", "password": "secret1"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    repo.remove_profile(b["user"]["id"].as_i64().unwrap() as i32);
    let (status, err) = send(&app, "POST", "/api/v1/auth/login", None, Some(json!({"email": "o@x.com", "password": "secret1"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err["error"], "profile_integrity_error");
}

#[tokio::test]
async fn bearer_middleware_messages() {
    let (_, app) = build_app();
    let (_, reg) = send(&app, "POST", "/api/v1/auth/register", None, Some(register_body("m@x.com", "secret1", "patient"))).await;

    let (status, err) = send(&app, "GET", "/api/v1/auth/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["message"], "missing bearer token");

    let (status, err) = send(&app, "GET", "/api/v1/auth/profile", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["message"], "invalid token");

    // refresh tokens are not accepted as bearer credentials
    let refresh = reg["refresh_token"].as_str().unwrap();
    let (status, _) = send(&app, "GET", "/api/v1/auth/profile", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = TokenIssuer::with_ttls(
        SigningSecret::new("integration-test-secret").unwrap(),
        chrono::Duration::hours(-1),
        chrono::Duration::days(7),
    );
    let now = chrono::Utc::now();
    let account = service::auth::Account {
        id: reg["user"]["id"].as_i64().unwrap() as i32,
        email: "m@x.com".into(),
        password_hash: String::new(),
        role: service::auth::Role::Patient,
        is_active: true,
        email_verified: false,
        created_at: now,
        updated_at: now,
    };
    let stale = expired.issue_access(&account).unwrap().token;
    let (status, err) = send(&app, "GET", "/api/v1/auth/profile", Some(stale.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["message"], "token expired");
}

#[tokio::test]
async fn health_docs_and_fallback() {
    let (_, app) = build_app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());

    let (status, body) = send(&app, "GET", "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/auth/login"].is_object());

    let (status, body) = send(&app, "GET", "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
    assert_eq!(body["message"], "The requested endpoint does not exist");
}
