//! HTTP API flows against an in-memory router.

mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use common::StubFetcher;
use pagepulse::checker::fetcher::FetchError;
use pagepulse::db::store::Store;
use pagepulse::notifications::service::NotificationService;
use pagepulse::scheduler::CheckScheduler;
use pagepulse::server::config::ServerConfig;
use pagepulse::web::{AppState, create_axum_router};

struct TestApp {
    _dir: TempDir,
    app: Router,
    fetcher: Arc<StubFetcher>,
}

fn test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(Store::open(dir.path()).unwrap());
    let fetcher = StubFetcher::new();
    let (service, _jobs) = NotificationService::new(8);
    let scheduler = Arc::new(CheckScheduler::new(
        store.clone(),
        fetcher.clone(),
        Arc::new(service),
    ));
    let config = Arc::new(ServerConfig {
        port: 0,
        data_dir: dir.path().to_path_buf(),
        resend_api_key: None,
        from_email: "PagePulse <notifications@pagepulse.dev>".to_string(),
    });
    let app = create_axum_router(Arc::new(AppState {
        store,
        scheduler,
        config,
    }));
    TestApp {
        _dir: dir,
        app,
        fetcher,
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    api_key: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/register",
        None,
        Some(serde_json::json!({ "email": email, "password": "hunter2!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["api_key"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn register_login_and_account_flow() {
    let t = test_app();
    let api_key = register(&t.app, "user@example.com").await;
    assert!(api_key.starts_with("pp_"));

    let (status, _) = send(
        &t.app,
        Method::POST,
        "/api/register",
        None,
        Some(serde_json::json!({ "email": "user@example.com", "password": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &t.app,
        Method::POST,
        "/api/login",
        None,
        Some(serde_json::json!({ "email": "user@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/api/login",
        None,
        Some(serde_json::json!({ "email": "user@example.com", "password": "hunter2!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_key"].as_str().unwrap(), api_key);
    assert_eq!(body["plan"], "free");

    let (status, body) = send(&t.app, Method::GET, "/api/account", Some(&api_key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["monitors"], 0);
    assert_eq!(body["limits"]["maxMonitors"], 3);
}

#[tokio::test]
async fn monitor_routes_require_an_api_key() {
    let t = test_app();
    let (status, _) = send(&t.app, Method::GET, "/api/monitors", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&t.app, Method::GET, "/api/monitors", Some("pp_bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_clamps_interval_to_the_plan_minimum() {
    let t = test_app();
    let api_key = register(&t.app, "clamp@example.com").await;

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/api/monitors",
        Some(&api_key),
        Some(serde_json::json!({
            "name": "docs",
            "url": "https://example.com/docs",
            "check_interval": 60
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Free plan floor is one day.
    assert_eq!(body["monitor"]["checkInterval"], 86_400);
}

#[tokio::test]
async fn plan_monitor_count_is_enforced() {
    let t = test_app();
    let api_key = register(&t.app, "limits@example.com").await;

    for i in 0..3 {
        let (status, _) = send(
            &t.app,
            Method::POST,
            "/api/monitors",
            Some(&api_key),
            Some(serde_json::json!({ "name": format!("m{i}"), "url": "https://example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/api/monitors",
        Some(&api_key),
        Some(serde_json::json!({ "name": "m4", "url": "https://example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("Plan limit"));
}

#[tokio::test]
async fn manual_check_returns_the_fetch_error_directly() {
    let t = test_app();
    let api_key = register(&t.app, "checker@example.com").await;

    let (_, body) = send(
        &t.app,
        Method::POST,
        "/api/monitors",
        Some(&api_key),
        Some(serde_json::json!({ "name": "down", "url": "https://example.com/down" })),
    )
    .await;
    let id = body["monitor"]["id"].as_str().unwrap().to_string();

    t.fetcher
        .push("https://example.com/down", Err(FetchError::HttpStatus(503)))
        .await;
    let uri = format!("/api/monitors/{id}/check");
    let (status, body) = send(&t.app, Method::POST, &uri, Some(&api_key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "HTTP 503");

    // The failed attempt still lands in the check history.
    let uri = format!("/api/monitors/{id}");
    let (_, body) = send(&t.app, Method::GET, &uri, Some(&api_key), None).await;
    assert_eq!(body["checks"].as_array().unwrap().len(), 1);
    assert_eq!(body["checks"][0]["error"], "HTTP 503");
}

#[tokio::test]
async fn monitors_are_scoped_to_their_owner() {
    let t = test_app();
    let owner = register(&t.app, "owner@example.com").await;
    let stranger = register(&t.app, "stranger@example.com").await;

    let (_, body) = send(
        &t.app,
        Method::POST,
        "/api/monitors",
        Some(&owner),
        Some(serde_json::json!({ "name": "mine", "url": "https://example.com" })),
    )
    .await;
    let id = body["monitor"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/monitors/{id}");
    let (status, _) = send(&t.app, Method::GET, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&t.app, Method::DELETE, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&t.app, Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_and_stats_are_public() {
    let t = test_app();
    let (status, body) = send(&t.app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    register(&t.app, "stat@example.com").await;
    let (status, body) = send(&t.app, Method::GET, "/api/stats", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"], 1);
}

#[tokio::test]
async fn pausing_a_monitor_via_update() {
    let t = test_app();
    let api_key = register(&t.app, "pause@example.com").await;

    let (_, body) = send(
        &t.app,
        Method::POST,
        "/api/monitors",
        Some(&api_key),
        Some(serde_json::json!({ "name": "m", "url": "https://example.com" })),
    )
    .await;
    let id = body["monitor"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/monitors/{id}");
    let (status, body) = send(
        &t.app,
        Method::PUT,
        &uri,
        Some(&api_key),
        Some(serde_json::json!({ "status": "paused", "keywords": ["sale"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["monitor"]["status"], "paused");
    assert_eq!(body["monitor"]["keywords"][0], "sale");
}
