//! Listing stream integration tests.
//!
//! Tests verify:
//! - NDJSON framing and response headers of `/api/images`
//! - Event ordering: processing marker, batch progress, terminal event
//! - Continuation token forwarding and page size propagation
//! - Backend failures end the stream with a single error event

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use gallery_streamer::storage::ObjectEntry;
use gallery_streamer::{ListingOptions, Progress, StreamEvent};

use super::test_utils::{
    keys, read_events, signed_url, test_router, test_router_with_options, MockObjectStore,
};

fn images_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn progress_of(events: &[StreamEvent]) -> Vec<Progress> {
    events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::Processing { progress } => *progress,
            _ => None,
        })
        .collect()
}

// =============================================================================
// Successful Pages
// =============================================================================

#[tokio::test]
async fn test_first_page_events_and_headers() {
    let page = keys("cat", 3);
    let store = MockObjectStore::new().with_page(None, &page, Some("token-2"));
    let router = test_router(store);

    let response = router.oneshot(images_request("/api/images")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
    assert_eq!(response.headers().get("cache-control").unwrap(), "no-cache");

    let events = read_events(response).await;

    assert_eq!(events.first(), Some(&StreamEvent::started()));
    assert_eq!(progress_of(&events), vec![Progress { processed: 3, total: 3 }]);

    let Some(StreamEvent::Complete {
        images,
        has_more,
        continuation_token,
    }) = events.last()
    else {
        panic!("expected a complete event, got {:?}", events.last());
    };

    let names: Vec<&str> = images.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(names, vec!["cat-00.png", "cat-01.png", "cat-02.png"]);
    assert_eq!(
        images[0].url,
        signed_url("cat-00.png", Duration::from_secs(3600))
    );
    assert!(*has_more);
    assert_eq!(continuation_token.as_deref(), Some("token-2"));

    // Exactly one terminal event, and it is last
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
}

#[tokio::test]
async fn test_continuation_token_is_forwarded() {
    let store = MockObjectStore::new()
        .with_page(None, &keys("a", 2), Some("abc/123=="))
        .with_page(Some("abc/123=="), &keys("b", 2), None);
    let tracker = store.clone();
    let router = test_router(store);

    let response = router
        .oneshot(images_request("/api/images?continuationToken=abc%2F123%3D%3D"))
        .await
        .unwrap();
    let events = read_events(response).await;

    assert_eq!(
        tracker.list_calls(),
        vec![(20, Some("abc/123==".to_string()))]
    );

    let Some(StreamEvent::Complete {
        images,
        has_more,
        continuation_token,
    }) = events.last()
    else {
        panic!("expected a complete event");
    };
    assert_eq!(images[0].file_name, "b-00.png");
    assert!(!*has_more);
    assert!(continuation_token.is_none());
}

#[tokio::test]
async fn test_empty_token_requests_first_page() {
    let store = MockObjectStore::new().with_page(None, &keys("a", 1), None);
    let tracker = store.clone();
    let router = test_router(store);

    let response = router
        .oneshot(images_request("/api/images?continuationToken="))
        .await
        .unwrap();
    read_events(response).await;

    assert_eq!(tracker.list_calls(), vec![(20, None)]);
}

#[tokio::test]
async fn test_empty_bucket_yields_single_empty_complete() {
    let router = test_router(MockObjectStore::new());

    let response = router.oneshot(images_request("/api/images")).await.unwrap();
    let events = read_events(response).await;

    assert_eq!(
        events,
        vec![
            StreamEvent::started(),
            StreamEvent::complete(Vec::new(), false, None),
        ]
    );
}

#[tokio::test]
async fn test_batches_report_cumulative_progress() {
    let store = MockObjectStore::new().with_page(None, &keys("img", 23), None);
    let router = test_router_with_options(
        store,
        ListingOptions::default().with_page_size(23).with_batch_size(5),
    );

    let response = router.oneshot(images_request("/api/images")).await.unwrap();
    let events = read_events(response).await;

    let processed: Vec<usize> = progress_of(&events).iter().map(|p| p.processed).collect();
    assert_eq!(processed, vec![5, 10, 15, 20, 23]);
    assert!(progress_of(&events).iter().all(|p| p.total == 23));

    // processing marker + 5 progress events + complete
    assert_eq!(events.len(), 7);
    match events.last() {
        Some(StreamEvent::Complete { images, .. }) => assert_eq!(images.len(), 23),
        other => panic!("expected complete, got {:?}", other),
    }
}

#[tokio::test]
async fn test_entries_without_key_are_skipped() {
    let objects = vec![
        ObjectEntry::new("a.png").with_etag("\"etag-a\""),
        ObjectEntry::default(),
        ObjectEntry::new("c.png"),
    ];
    let store = MockObjectStore::new().with_objects(None, objects, None);
    let router = test_router(store);

    let response = router.oneshot(images_request("/api/images")).await.unwrap();
    let events = read_events(response).await;

    // The skipped entry still counts as processed
    assert_eq!(progress_of(&events), vec![Progress { processed: 3, total: 3 }]);

    let Some(StreamEvent::Complete { images, .. }) = events.last() else {
        panic!("expected complete");
    };
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].id, "etag-a");
    assert_eq!(images[1].id, "c.png");
}

#[tokio::test]
async fn test_page_size_and_expiry_options() {
    let store = MockObjectStore::new().with_page(None, &keys("a", 1), None);
    let tracker = store.clone();
    let router = test_router_with_options(
        store,
        ListingOptions::default()
            .with_page_size(50)
            .with_url_expiry(Duration::from_secs(600)),
    );

    let response = router.oneshot(images_request("/api/images")).await.unwrap();
    let events = read_events(response).await;

    assert_eq!(tracker.list_calls(), vec![(50, None)]);
    let Some(StreamEvent::Complete { images, .. }) = events.last() else {
        panic!("expected complete");
    };
    assert!(images[0].url.ends_with("X-Amz-Expires=600"));
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_listing_failure_yields_error_event() {
    let router = test_router(MockObjectStore::new().failing_list());

    let response = router.oneshot(images_request("/api/images")).await.unwrap();

    // Failures are reported in-band
    assert_eq!(response.status(), StatusCode::OK);

    let events = read_events(response).await;
    assert_eq!(
        events,
        vec![
            StreamEvent::started(),
            StreamEvent::failure("Failed to process images"),
        ]
    );
}

#[tokio::test]
async fn test_signing_failure_in_second_batch() {
    let page = keys("img", 15);
    let store = MockObjectStore::new()
        .with_page(None, &page, Some("next"))
        .failing_presign("img-07.png");
    let tracker = store.clone();
    let router = test_router_with_options(
        store,
        ListingOptions::default().with_batch_size(5),
    );

    let response = router.oneshot(images_request("/api/images")).await.unwrap();
    let events = read_events(response).await;

    assert_eq!(
        events,
        vec![
            StreamEvent::started(),
            StreamEvent::progress(5, 15),
            StreamEvent::failure("Failed to process images"),
        ]
    );

    // The third batch is never started
    assert!(tracker
        .presigned_keys()
        .iter()
        .all(|key| key.as_str() < "img-10.png"));
}

#[tokio::test]
async fn test_unknown_query_parameters_are_ignored() {
    let store = MockObjectStore::new().with_page(None, &keys("a", 1), None);
    let router = test_router(store);

    let response = router
        .oneshot(images_request("/api/images?foo=bar"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let events = read_events(response).await;
    assert!(matches!(events.last(), Some(StreamEvent::Complete { .. })));
}
