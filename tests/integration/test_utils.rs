//! Test utilities for integration tests.
//!
//! This module provides an in-memory object store, router builders and
//! helpers for running servers on real sockets.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;

use gallery_streamer::error::StorageError;
use gallery_streamer::{
    create_router, decode_line, ListingOptions, ListingService, ObjectEntry, ObjectPage,
    ObjectStore, RouterConfig, StreamEvent,
};

// =============================================================================
// Mock Object Store
// =============================================================================

/// An in-memory object store with pages keyed by the continuation token
/// that requests them.
///
/// Clones share their tracking state, so a test can keep a handle after
/// moving the store into a listing service.
#[derive(Clone, Default)]
pub struct MockObjectStore {
    pages: Arc<HashMap<Option<String>, ObjectPage>>,
    fail_listing: bool,
    fail_keys: Arc<HashSet<String>>,
    list_calls: Arc<Mutex<Vec<(usize, Option<String>)>>>,
    presigned: Arc<Mutex<Vec<String>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `keys` for requests carrying `token`, pointing at `next`.
    pub fn with_page(self, token: Option<&str>, keys: &[String], next: Option<&str>) -> Self {
        let objects = keys.iter().map(|key| ObjectEntry::new(key.clone())).collect();
        self.with_objects(token, objects, next)
    }

    pub fn with_objects(
        mut self,
        token: Option<&str>,
        objects: Vec<ObjectEntry>,
        next: Option<&str>,
    ) -> Self {
        let mut pages = (*self.pages).clone();
        pages.insert(
            token.map(str::to_string),
            ObjectPage {
                objects,
                is_truncated: next.is_some(),
                next_continuation_token: next.map(str::to_string),
            },
        );
        self.pages = Arc::new(pages);
        self
    }

    /// Make every listing call fail.
    pub fn failing_list(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Make signing `key` fail.
    pub fn failing_presign(mut self, key: &str) -> Self {
        let mut keys = (*self.fail_keys).clone();
        keys.insert(key.to_string());
        self.fail_keys = Arc::new(keys);
        self
    }

    /// `(max_keys, continuation_token)` of every listing call.
    pub fn list_calls(&self) -> Vec<(usize, Option<String>)> {
        self.list_calls.lock().unwrap().clone()
    }

    /// Keys signed so far.
    pub fn presigned_keys(&self) -> Vec<String> {
        self.presigned.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn list_page(
        &self,
        max_keys: usize,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, StorageError> {
        let token = continuation_token.map(str::to_string);
        self.list_calls
            .lock()
            .unwrap()
            .push((max_keys, token.clone()));

        if self.fail_listing {
            return Err(StorageError::S3("listing unavailable".to_string()));
        }

        Ok(self.pages.get(&token).cloned().unwrap_or_default())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        if self.fail_keys.contains(key) {
            return Err(StorageError::Presign {
                key: key.to_string(),
                message: "signing refused".to_string(),
            });
        }

        self.presigned.lock().unwrap().push(key.to_string());
        Ok(signed_url(key, expires_in))
    }
}

/// URL the mock store hands out for `key`.
pub fn signed_url(key: &str, expires_in: Duration) -> String {
    format!(
        "https://signed.example/{}?X-Amz-Expires={}",
        key,
        expires_in.as_secs()
    )
}

/// `count` keys named `{prefix}-{index:02}.png`.
pub fn keys(prefix: &str, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("{}-{:02}.png", prefix, i))
        .collect()
}

// =============================================================================
// Router Helpers
// =============================================================================

/// Router over `store` with default listing options and tracing disabled.
pub fn test_router(store: MockObjectStore) -> Router {
    test_router_with_options(store, ListingOptions::default())
}

pub fn test_router_with_options(store: MockObjectStore, options: ListingOptions) -> Router {
    let listing = ListingService::with_options(store, options);
    create_router(listing, RouterConfig::new().with_tracing(false))
}

/// Collect a response body and decode it line by line.
pub async fn read_events(response: Response) -> Vec<StreamEvent> {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();

    assert!(text.ends_with('\n'), "every event must end with a newline");

    text.lines()
        .map(|line| decode_line(line).unwrap())
        .collect()
}

pub async fn read_body(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

// =============================================================================
// Real Sockets
// =============================================================================

/// Serve `router` on an ephemeral local port.
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    addr
}

/// A local address with nothing listening on it.
pub async fn closed_address() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Bytes served by the fake image host.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

/// A fake image host standing in for the bucket behind the signed URLs.
///
/// - `/cat.png` - PNG bytes with `Content-Type: image/png`
/// - `/raw` - bytes without a `Content-Type`
/// - `/missing` - 404
///
/// Returns the address and a counter of requests received.
pub async fn spawn_image_host() -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));

    let router = Router::new()
        .route("/cat.png", get(cat_png))
        .route("/raw", get(raw_bytes))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .layer(middleware::from_fn_with_state(Arc::clone(&hits), count_hits));

    (spawn_server(router).await, hits)
}

async fn cat_png() -> Response {
    ([(header::CONTENT_TYPE, "image/png")], PNG_BYTES).into_response()
}

async fn raw_bytes() -> Response {
    Response::new(Body::from(PNG_BYTES))
}

async fn count_hits(
    State(hits): State<Arc<AtomicUsize>>,
    request: Request,
    next: Next,
) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}
