//! Track endpoint integration tests
//!
//! These tests drive the track router end to end against in-memory SQLite:
//! header resolution, visit persistence, error shapes and CORS handling.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use tracklink::storage::{SqliteStorage, Storage};
use tracklink::track::{self, routes::with_boundary};

/// Helper to create test storage
///
/// A single connection keeps the shared in-memory database free of lock
/// contention under concurrent requests.
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn assert_cors_headers(response: &axum::response::Response) {
    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "*",
        "missing allow-origin header"
    );
    assert_eq!(
        headers.get("access-control-allow-headers").unwrap(),
        "authorization, x-client-info, apikey, content-type"
    );
}

#[tokio::test]
async fn test_track_known_slug_records_visit() {
    let storage = create_test_storage().await;
    storage
        .create_link("Campaign", "my-link", Some("owner"))
        .await
        .unwrap();

    let app = track::create_track_router(storage.clone());

    let request = Request::builder()
        .uri("/track/my-link")
        .header("cf-connecting-ip", "192.168.1.50")
        .header("user-agent", "Mozilla/5.0 (X11; Linux x86_64)")
        .header("referer", "https://example.com/post")
        .header("accept-language", "vi-VN,vi;q=0.9")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(&response);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "IP recorded successfully");
    assert_eq!(json["slug"], "my-link");
    assert_eq!(json["ipInfo"]["ip"], "192.168.1.50");
    assert_eq!(json["ipInfo"]["isPrivate"], true);
    assert_eq!(json["ipInfo"]["source"], "cf-connecting-ip");
    assert_eq!(json["userAgent"], "Mozilla/5.0 (X11; Linux x86_64)");

    let visits = storage.list_visits_for_link("my-link", 10, 0).await.unwrap();
    assert_eq!(visits.len(), 1, "exactly one visit should be written");
    let visit = &visits[0].visit;
    assert_eq!(visit.ip_address, "192.168.1.50");
    assert_eq!(visit.ip_source, "cf-connecting-ip");
    assert!(visit.is_private_ip);
    assert_eq!(visit.user_agent, "Mozilla/5.0 (X11; Linux x86_64)");
    assert_eq!(visit.referer.as_deref(), Some("https://example.com/post"));
    assert_eq!(visit.language.as_deref(), Some("vi-VN,vi;q=0.9"));
    assert_eq!(visits[0].link_name, "Campaign");
}

#[tokio::test]
async fn test_track_unknown_slug_returns_500_without_visit() {
    let storage = create_test_storage().await;
    storage
        .create_link("Other", "other-link", None)
        .await
        .unwrap();

    let app = track::create_track_router(storage.clone());

    let request = Request::builder()
        .uri("/track/does-not-exist")
        .header("x-forwarded-for", "203.0.113.5")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors_headers(&response);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Failed to record visit");
    assert_eq!(json["slug"], "does-not-exist");
    assert!(json["details"].as_str().unwrap().contains("does-not-exist"));

    let visits = storage.list_visits(100, 0).await.unwrap();
    assert!(visits.is_empty(), "no visit should be written");
}

#[tokio::test]
async fn test_track_missing_slug_returns_400() {
    let storage = create_test_storage().await;
    let app = track::create_track_router(storage.clone());

    for uri in ["/track/", "/"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {uri}");
        assert_cors_headers(&response);

        let json = body_json(response).await;
        assert_eq!(json["error"], "No slug provided");
    }

    assert!(storage.list_visits(100, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_options_preflight_returns_204_empty() {
    let storage = create_test_storage().await;
    let app = track::create_track_router(storage.clone());

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/track/anything")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_cors_headers(&response);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty(), "preflight response must have no body");
    assert!(storage.list_visits(100, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_track_without_proxy_headers_uses_default_ip() {
    let storage = create_test_storage().await;
    storage.create_link("Direct", "direct", None).await.unwrap();

    let app = track::create_track_router(storage.clone());

    let request = Request::builder()
        .uri("/track/direct")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let visits = storage.list_visits_for_link("direct", 10, 0).await.unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].visit.ip_address, "127.0.0.1");
    assert_eq!(visits[0].visit.ip_source, "default");
    assert!(visits[0].visit.is_private_ip);
    assert_eq!(visits[0].visit.user_agent, "unknown");
}

#[tokio::test]
async fn test_track_priority_order_over_forwarded_for() {
    let storage = create_test_storage().await;
    storage.create_link("Priority", "prio", None).await.unwrap();

    let app = track::create_track_router(storage.clone());

    let request = Request::builder()
        .uri("/track/prio")
        .header("true-client-ip", "8.8.8.8")
        .header("x-forwarded-for", "10.0.0.5, 8.8.8.8")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["ipInfo"]["ip"], "8.8.8.8");
    assert_eq!(json["ipInfo"]["isPrivate"], false);
    assert_eq!(json["ipInfo"]["source"], "true-client-ip");
}

#[tokio::test]
async fn test_concurrent_visits_are_each_recorded() {
    let storage = create_test_storage().await;
    storage.create_link("Popular", "popular", None).await.unwrap();

    let app = track::create_track_router(storage.clone());

    let mut handles = vec![];
    for i in 0..20 {
        let app_clone = app.clone();
        handles.push(tokio::spawn(async move {
            let request = Request::builder()
                .uri("/track/popular")
                .header("x-forwarded-for", format!("203.0.113.{}, 10.0.0.{}", i, i))
                .body(Body::empty())
                .unwrap();
            app_clone.oneshot(request).await.unwrap()
        }));
    }

    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let visits = storage.list_visits_for_link("popular", 100, 0).await.unwrap();
    assert_eq!(visits.len(), 20, "every request should record one visit");
    assert!(visits
        .iter()
        .all(|v| v.visit.is_private_ip && v.visit.ip_address.starts_with("10.0.0.")));
}

#[tokio::test]
async fn test_deleted_link_no_longer_records() {
    let storage = create_test_storage().await;
    storage.create_link("Short lived", "short", None).await.unwrap();
    assert!(storage.delete_link("short").await.unwrap());

    let app = track::create_track_router(storage.clone());

    let request = Request::builder()
        .uri("/track/short")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(storage.list_visits(100, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_panicking_handler_still_gets_response() {
    async fn boom() -> &'static str {
        panic!("unexpected input shape")
    }

    let app: Router = with_boundary(Router::new().route("/boom", get(boom)));

    let request = Request::builder().uri("/boom").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors_headers(&response);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Internal Server Error");
}
