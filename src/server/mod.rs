//! HTTP server layer for the gallery.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │      GET /api/images?continuationToken=...  (NDJSON)            │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │   gallery   │  │        routes           │  │
//! │  │ (requests)  │  │ (HTML page) │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod gallery;
pub mod handlers;
pub mod routes;

pub use handlers::{
    download_handler, gallery_handler, health_handler, images_handler, AppState,
    DownloadQueryParams, HealthResponse, ImagesQueryParams, DEFAULT_GALLERY_TITLE,
    DOWNLOAD_FAILURE_MESSAGE,
};
pub use routes::{create_router, RouterConfig};
