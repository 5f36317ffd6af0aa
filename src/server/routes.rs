//! Router configuration for the gallery server.
//!
//! # Route Structure
//!
//! ```text
//! /                 - Gallery page
//! /health           - Health check
//! /api/images       - NDJSON listing stream
//! /api/download     - Download proxy
//! ```
//!
//! # Example
//!
//! ```ignore
//! use gallery_streamer::listing::ListingService;
//! use gallery_streamer::server::{create_router, RouterConfig};
//!
//! let listing = ListingService::new(store);
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(listing, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    download_handler, gallery_handler, health_handler, images_handler, AppState,
    DEFAULT_GALLERY_TITLE,
};
use crate::listing::ListingService;
use crate::storage::ObjectStore;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Title of the gallery page
    pub gallery_title: String,

    /// Outbound client for the download proxy (None = default client)
    pub http_client: Option<reqwest::Client>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    /// - The download proxy uses a default `reqwest::Client`
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
            gallery_title: DEFAULT_GALLERY_TITLE.to_string(),
            http_client: None,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    pub fn with_gallery_title(mut self, title: impl Into<String>) -> Self {
        self.gallery_title = title.into();
        self
    }

    /// Use a preconfigured client (timeouts, proxies) for the download proxy.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// All routes are public; the listing stream only hands out time-limited
/// signed URLs.
pub fn create_router<S>(listing: ListingService<S>, config: RouterConfig) -> Router
where
    S: ObjectStore + 'static,
{
    let cors = build_cors_layer(&config);

    let http = config.http_client.clone().unwrap_or_default();
    let app_state = AppState::new(listing, http).with_gallery_title(config.gallery_title);

    let router = Router::new()
        .route("/", get(gallery_handler::<S>))
        .route("/health", get(health_handler))
        .route("/api/images", get(images_handler::<S>))
        .route("/api/download", get(download_handler::<S>))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .expose_headers([CONTENT_DISPOSITION])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
