//! HTTP request handlers for the gallery API.
//!
//! # Endpoints
//!
//! - `GET /` - Gallery page
//! - `GET /api/images` - Stream one listing page as NDJSON
//! - `GET /api/download` - Proxy an image download
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::DownloadError;
use crate::listing::ListingService;
use crate::protocol::{encode_event, DEFAULT_FILE_NAME};
use crate::storage::ObjectStore;

/// Body returned when the download proxy fails.
pub const DOWNLOAD_FAILURE_MESSAGE: &str = "Error downloading image";

/// Title of the gallery page unless configured otherwise.
pub const DEFAULT_GALLERY_TITLE: &str = "Image Gallery";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: ObjectStore> {
    /// Listing service streaming pages of signed image URLs
    pub listing: Arc<ListingService<S>>,

    /// Outbound client used by the download proxy
    pub http: reqwest::Client,

    /// Title of the gallery page
    pub gallery_title: String,
}

impl<S: ObjectStore + 'static> AppState<S> {
    /// Create a new application state with the given listing service.
    pub fn new(listing: ListingService<S>, http: reqwest::Client) -> Self {
        Self {
            listing: Arc::new(listing),
            http,
            gallery_title: DEFAULT_GALLERY_TITLE.to_string(),
        }
    }

    /// Set the title shown on the gallery page.
    pub fn with_gallery_title(mut self, title: impl Into<String>) -> Self {
        self.gallery_title = title.into();
        self
    }
}

impl<S: ObjectStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            listing: Arc::clone(&self.listing),
            http: self.http.clone(),
            gallery_title: self.gallery_title.clone(),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for the listing endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagesQueryParams {
    /// Cursor returned by the previous page; absent or empty for the first page
    #[serde(default)]
    pub continuation_token: Option<String>,
}

impl ImagesQueryParams {
    /// The cursor, with an empty value treated as absent.
    pub fn cursor(&self) -> Option<&str> {
        self.continuation_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

/// Query parameters for the download proxy.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQueryParams {
    /// Absolute URL of the image to fetch
    #[serde(default)]
    pub url: Option<String>,

    /// Suggested name for the saved file (defaults to `image.png`)
    #[serde(default)]
    pub file_name: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert DownloadError to a plain-text HTTP response.
///
/// A missing URL is the caller's fault (400, logged at WARN); every upstream
/// failure is reported as 500 with a fixed body and logged at ERROR.
impl IntoResponse for DownloadError {
    fn into_response(self) -> Response {
        match &self {
            DownloadError::MissingUrl => {
                warn!(status = 400, "Client error: {}", self);
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            DownloadError::Upstream(_) | DownloadError::UpstreamStatus(_) => {
                error!(status = 500, "Error downloading image: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, DOWNLOAD_FAILURE_MESSAGE).into_response()
            }
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle listing requests.
///
/// # Endpoint
///
/// `GET /api/images`
///
/// # Query Parameters
///
/// - `continuationToken`: Cursor from the previous page's `complete` event
///
/// # Response
///
/// `200 OK` with an NDJSON body, one event per line:
/// ```text
/// {"status":"processing"}
/// {"status":"processing","progress":{"processed":5,"total":20}}
/// {"status":"complete","images":[...],"hasMore":true,"continuationToken":"..."}
/// ```
///
/// Backend failures are reported in-band as a final `error` event; the status
/// code is always 200 once streaming has started.
pub async fn images_handler<S: ObjectStore + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<ImagesQueryParams>,
) -> Response {
    let cursor = query.cursor().map(str::to_string);
    debug!(continuation_token = ?cursor, "Streaming image page");

    let events = state
        .listing
        .stream_page(cursor)
        .map(|event| encode_event(&event));

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(events),
    )
        .into_response()
}

/// Handle download proxy requests.
///
/// # Endpoint
///
/// `GET /api/download`
///
/// # Query Parameters
///
/// - `url`: Image URL to fetch (required)
/// - `fileName`: Name suggested to the browser (default `image.png`)
///
/// # Response
///
/// `200 OK` streaming the upstream body with its `Content-Type`
/// (`application/octet-stream` when absent) and an attachment
/// `Content-Disposition`.
///
/// # Errors
///
/// - `400 Bad Request`: `url` missing or empty; nothing is fetched
/// - `500 Internal Server Error`: fetch failed or upstream status not 2xx
pub async fn download_handler<S: ObjectStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<DownloadQueryParams>,
) -> Result<Response, DownloadError> {
    let url = query
        .url
        .filter(|url| !url.is_empty())
        .ok_or(DownloadError::MissingUrl)?;

    let file_name = query
        .file_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());

    debug!(file_name = %file_name, "Proxying image download");

    let upstream = state
        .http
        .get(&url)
        .send()
        .await
        .map_err(|e| DownloadError::Upstream(e.to_string()))?;

    if !upstream.status().is_success() {
        return Err(DownloadError::UpstreamStatus(upstream.status().as_u16()));
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition(&file_name))
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| DownloadError::Upstream(e.to_string()))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle gallery page requests.
///
/// # Endpoint
///
/// `GET /`
pub async fn gallery_handler<S: ObjectStore>(State(state): State<AppState<S>>) -> Html<String> {
    Html(super::gallery::generate_gallery_html(&state.gallery_title))
}

/// Build an attachment `Content-Disposition` for `file_name`.
///
/// The quoted `filename` holds an ASCII rendition; `filename*` carries the
/// exact name percent-encoded.
fn content_disposition(file_name: &str) -> HeaderValue {
    let ascii: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();

    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(file_name)
    );

    HeaderValue::from_str(&value)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"image.png\""))
}

// =============================================================================
// Tests
// =============================================================================
