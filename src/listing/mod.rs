//! Listing layer.
//!
//! Sits between the HTTP handlers and the object store:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        GET /api/images handler          │
//! └────────────────────┬────────────────────┘
//!                      │ continuation token
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            ListingService               │
//! │   (page → signed URL batches → events)  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          ObjectStore (S3, mock)         │
//! └─────────────────────────────────────────┘
//! ```

mod service;

pub use service::{
    ListingOptions, ListingService, DEFAULT_BATCH_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_URL_EXPIRY,
    LISTING_FAILURE_MESSAGE,
};
