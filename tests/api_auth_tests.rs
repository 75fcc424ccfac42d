//! 认证 API 集成测试

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tower::ServiceExt;
use visiontrack_api::{
    error::AppError,
    models::user::Principal,
    repository::DirectoryStore,
    routes,
    services::IdentityMirror,
};

mod common;
use common::{TestApp, PASSWORD};

/// 总是失败的上游镜像
#[derive(Default)]
struct FailingMirror {
    calls: AtomicUsize,
}

#[async_trait]
impl IdentityMirror for FailingMirror {
    async fn mirror(&self, _principal: &Principal) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Upstream("mirror offline".to_string()))
    }
}

fn register_body(email: &str) -> Value {
    json!({
        "email": email,
        "name": "Owner",
        "password": PASSWORD,
        "business_name": "Acme",
    })
}

#[tokio::test]
async fn test_register_returns_token_user_and_business() {
    let app = TestApp::new();

    let (status, json) = app
        .send(Method::POST, "/api/auth/register", None, Some(register_body("owner@acme.io")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(json["token"].is_string());
    assert_eq!(json["user"]["email"], "owner@acme.io");
    assert_eq!(json["user"]["role"], "BUSINESS_OWNER");
    assert!(json["user"].get("password_hash").is_none());
    assert_eq!(json["business"]["name"], "Acme");
    assert_eq!(json["business"]["owner_id"], json["user"]["id"]);
    assert_eq!(json["business"]["is_active"], true);
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = TestApp::new();
    app.register_owner("owner@acme.io", "Acme").await;

    let (status, json) = app
        .send(Method::POST, "/api/auth/register", None, Some(register_body("OWNER@acme.io")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json, json!({ "error": "Email already registered" }));
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new();

    let (status, json) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "name": "", "password": PASSWORD, "business_name": "Acme" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "email: must be a valid email address");

    let (status, json) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "o@acme.io", "name": "O", "password": "alllowercase", "business_name": "Acme" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("password:"));

    let mut body = register_body("o@acme.io");
    body["role"] = json!("ADMIN");
    let (status, json) = app
        .send(Method::POST, "/api/auth/register", None, Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("unknown field"));

    // 校验失败时不写入任何数据
    assert!(app.store.find_user_by_email("o@acme.io").await.unwrap().is_none());
}

#[tokio::test]
async fn test_login_success_and_failures() {
    let app = TestApp::new();
    app.register_owner("owner@acme.io", "Acme").await;

    let (status, json) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "owner@acme.io", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["token"].is_string());
    assert_eq!(json["expires_in"], 3600);
    assert_eq!(json["user"]["email"], "owner@acme.io");

    let (status, json) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "owner@acme.io", "password": "WrongPass1" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json, json!({ "error": "Unauthorized" }));

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@acme.io", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_session() {
    let app = TestApp::new();
    let owner = app.register_owner("owner@acme.io", "Acme").await;

    let (status, json) = app.send(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Unauthorized");

    let (status, _) = app.get("/api/auth/me", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = app.get("/api/auth/me", &owner.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["id"], json!(owner.user_id));
    assert_eq!(json["business_id"], json!(owner.business_id));
    assert_eq!(json["is_admin"], false);
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let app = TestApp::new();
    let owner = app.register_owner("owner@acme.io", "Acme").await;
    let router = routes::create_router(app.state.clone());

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/me")
                .header(header::COOKIE, format!("theme=dark; vt_session={}", owner.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["business_id"], json!(owner.business_id));
}

#[tokio::test]
async fn test_mirror_failure_does_not_fail_registration() {
    let mirror = Arc::new(FailingMirror::default());
    let app = TestApp::with_mirror(mirror.clone());

    let owner = app.register_owner("owner@acme.io", "Acme").await;
    assert_eq!(mirror.calls.load(Ordering::SeqCst), 1);
    assert!(app.store.find_user(owner.user_id).await.unwrap().is_some());

    // 邀请新员工同样只记录镜像失败
    app.invite_staff(&owner, "guard@acme.io").await;
    assert_eq!(mirror.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_trace_id_is_echoed() {
    let app = TestApp::new();
    let router = routes::create_router(app.state.clone());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-trace-id", "trace-abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-trace-id"], "trace-abc");
}
