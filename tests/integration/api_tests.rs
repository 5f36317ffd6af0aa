//! API integration tests for the auxiliary routes and middleware.
//!
//! Tests verify:
//! - Health check and gallery page
//! - CORS handling
//! - Unknown routes

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use tower::ServiceExt;

use gallery_streamer::{create_router, ListingService, RouterConfig};

use super::test_utils::{read_body, test_router, MockObjectStore};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let router = test_router(MockObjectStore::new());

    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_body(response).await;
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_gallery_page() {
    let listing = ListingService::new(MockObjectStore::new());
    let router = create_router(
        listing,
        RouterConfig::new()
            .with_tracing(false)
            .with_gallery_title("Field Photos"),
    );

    let response = router.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));

    let html = String::from_utf8(read_body(response).await).unwrap();
    assert!(html.contains("<title>Field Photos</title>"));
    assert!(html.contains("/api/images"));
}

#[tokio::test]
async fn test_gallery_page_does_not_touch_storage() {
    let store = MockObjectStore::new();
    let tracker = store.clone();
    let router = test_router(store);

    let response = router.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(tracker.list_calls().is_empty());
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let router = test_router(MockObjectStore::new());

    let response = router.oneshot(get("/api/unknown")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_not_allowed() {
    let router = test_router(MockObjectStore::new());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/images")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn test_cors_any_origin() {
    let router = test_router(MockObjectStore::new());

    let request = Request::builder()
        .uri("/health")
        .header("origin", "https://gallery.example")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_preflight_specific_origin() {
    let listing = ListingService::new(MockObjectStore::new());
    let router = create_router(
        listing,
        RouterConfig::new()
            .with_tracing(false)
            .with_cors_origins(vec!["https://gallery.example".to_string()]),
    );

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/images")
        .header("origin", "https://gallery.example")
        .header("access-control-request-method", "GET")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "https://gallery.example"
    );
}

#[tokio::test]
async fn test_cors_rejects_other_origin() {
    let listing = ListingService::new(MockObjectStore::new());
    let router = create_router(
        listing,
        RouterConfig::new()
            .with_tracing(false)
            .with_cors_origins(vec!["https://gallery.example".to_string()]),
    );

    let request = Request::builder()
        .uri("/health")
        .header("origin", "https://evil.example")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}
