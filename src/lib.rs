//! # Gallery Streamer
//!
//! An infinite-scroll image gallery over S3-compatible object storage.
//!
//! The server lists a bucket one page at a time, signs a time-limited GET URL
//! for every object and streams the result to the browser as
//! newline-delimited JSON, reporting progress while the signatures are
//! produced. A Rust client drives the same protocol with a single-flight,
//! cancellable page loader.
//!
//! ## Features
//!
//! - **Progressive listing**: `processing` events with signing progress, then one `complete` page
//! - **Bounded signing**: URLs are signed in concurrent batches of configurable size
//! - **Infinite scroll**: prefetching sentinel and continuation-token paging on the client
//! - **Download proxy**: fetches an image server-side and returns it as an attachment
//! - **Built-in gallery page**: HTML grid served at `/`
//!
//! ## Architecture
//!
//! - [`protocol`] - Stream events and NDJSON framing
//! - [`storage`] - Object store abstraction and the S3 implementation
//! - [`listing`] - Page listing and batched URL signing
//! - [`server`] - Axum-based HTTP server and routes
//! - [`client`] - Gallery client and controller
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use gallery_streamer::{
//!     create_router, create_s3_client, ListingOptions, ListingService, RouterConfig,
//!     S3ObjectStore,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = create_s3_client(None, "us-east-1", None).await;
//!     let store = S3ObjectStore::new(client, "my-images".to_string());
//!     let listing = ListingService::with_options(store, ListingOptions::default());
//!
//!     let router = create_router(listing, RouterConfig::new());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod listing;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types
pub use client::{
    GalleryClient, GalleryController, GalleryState, LoadOutcome, PageSource, Sentinel,
    SentinelBox, Viewport,
};
pub use config::{BrowseConfig, CheckConfig, Cli, Command, S3Args, ServeConfig};
pub use error::{ClientError, DownloadError, StorageError};
pub use listing::{ListingOptions, ListingService};
pub use protocol::{decode_line, encode_event, ImageRecord, LineDecoder, Progress, StreamEvent};
pub use server::{create_router, AppState, RouterConfig};
pub use storage::{
    backblaze_endpoint, create_s3_client, ObjectEntry, ObjectPage, ObjectStore, S3ObjectStore,
};
