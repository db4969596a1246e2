//! Router-level API tests.
//!
//! These drive the full router with `tower::ServiceExt::oneshot` against a
//! lazily-connected pool, so everything that doesn't reach the database can
//! be exercised without one: health, auth rejections, the response
//! envelope, security headers, and the audit trail.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tempfile::TempDir;
use tower::ServiceExt;

use moostyle_server::config::ServerConfig;
use moostyle_server::middleware::{audit_middleware, security_headers_middleware};
use moostyle_server::routes;
use moostyle_server::state::AppState;

fn test_config(dir: &TempDir) -> ServerConfig {
    ServerConfig {
        database_url: secrecy::SecretString::from("postgres://localhost:1/unreachable"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:4000".to_string(),
        session_secret: secrecy::SecretString::from("k9#mQ2$xV7!pL4@nR8&wT3*zB6^cF1%j"),
        allowed_origins: vec!["http://localhost:5173".to_string()],
        security_log_path: dir.path().join("security.jsonl"),
        email: None,
    }
}

/// Build the app with the real middleware, minus the session layer (no DB).
fn app(dir: &TempDir) -> (Router, AppState) {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost:1/unreachable")
        .unwrap();
    let state = AppState::new(test_config(dir), pool).unwrap();

    let router = routes::routes()
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            audit_middleware,
        ))
        .with_state(state.clone());

    (router, state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_returns_success_envelope() {
    let dir = TempDir::new().unwrap();
    let (app, _state) = app(&dir);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "ok");
}

#[tokio::test]
async fn cart_requires_authentication() {
    let dir = TempDir::new().unwrap();
    let (app, _state) = app(&dir);

    let response = app.oneshot(get("/api/cart")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "authentication required");
}

#[tokio::test]
async fn download_requires_authentication() {
    let dir = TempDir::new().unwrap();
    let (app, _state) = app(&dir);

    let request = Request::builder()
        .method("POST")
        .uri("/api/cart/download")
        .header("x-forwarded-for", "203.0.113.10")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_endpoints_require_authentication() {
    let dir = TempDir::new().unwrap();
    let (app, _state) = app(&dir);

    for uri in [
        "/api/admin/users",
        "/api/admin/stats",
        "/api/admin/security/events",
        "/api/admin/recovery",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let json = body_json(response).await;
        assert_eq!(json["success"], false, "{uri}");
    }
}

#[tokio::test]
async fn unknown_route_is_404() {
    let dir = TempDir::new().unwrap();
    let (app, _state) = app(&dir);

    let response = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let dir = TempDir::new().unwrap();
    let (app, _state) = app(&dir);

    let response = app.oneshot(get("/health")).await.unwrap();
    let headers = response.headers();

    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::REFERRER_POLICY], "no-referrer");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store, max-age=0");
}

#[tokio::test]
async fn requests_are_written_to_the_audit_log() {
    let dir = TempDir::new().unwrap();
    let (app, state) = app(&dir);

    app.clone().oneshot(get("/health")).await.unwrap();

    // Percent-encoded, the way a real client sends it.
    let flagged = Request::builder()
        .method("GET")
        .uri("/health?q=%3Cscript%3Ealert(1)%3C%2Fscript%3E")
        .header("x-forwarded-for", "203.0.113.9")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    app.oneshot(flagged).await.unwrap();

    let events = state.security_log().tail(10).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].path, "/health");
    assert!(!events[0].suspicious);
    assert!(events[1].suspicious);
    assert_eq!(events[1].ip, "203.0.113.9");
    assert_eq!(events[1].status, 200);
    assert_eq!(events[1].request_id.as_deref(), Some("req-42"));
}

#[tokio::test]
async fn metrics_count_requests_by_bucket() {
    let dir = TempDir::new().unwrap();
    let (app, state) = app(&dir);

    app.clone().oneshot(get("/health")).await.unwrap();
    app.clone().oneshot(get("/api/nope")).await.unwrap();
    app.oneshot(get("/api/cart")).await.unwrap();

    let snapshot = state.metrics().snapshot();
    assert_eq!(snapshot.daily.len(), 1);
    let (_, counters) = snapshot.daily.iter().next().unwrap();
    assert_eq!(counters.total, 3);
    assert_eq!(counters.client_errors, 2);
    assert_eq!(counters.server_errors, 0);
}
