//! Object storage abstraction.
//!
//! The listing service only needs two things from a bucket: one page of
//! object keys at a time, and a signed GET URL per key. [`ObjectStore`]
//! captures exactly that, so tests can substitute an in-memory store for
//! [`S3ObjectStore`].

mod s3;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageError;

pub use s3::{backblaze_endpoint, create_s3_client, S3ObjectStore};

/// One entry of a listing page as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectEntry {
    /// Object key (S3 may omit it on malformed entries)
    pub key: Option<String>,

    /// Entity tag, usually the quoted MD5 of the content
    pub etag: Option<String>,
}

impl ObjectEntry {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            etag: None,
        }
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Stable identifier for the gallery: the ETag without quotes, falling
    /// back to the key when the ETag is absent or empty.
    pub fn image_id(&self) -> Option<String> {
        let etag = self
            .etag
            .as_deref()
            .map(|e| e.replace('"', ""))
            .filter(|e| !e.is_empty());

        etag.or_else(|| self.key.clone())
    }
}

/// One page of a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectPage {
    pub objects: Vec<ObjectEntry>,

    /// Whether the backend has more objects after this page
    pub is_truncated: bool,

    /// Token to pass back to fetch the next page
    pub next_continuation_token: Option<String>,
}

/// Storage backend used by the listing service.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List up to `max_keys` objects, resuming at `continuation_token`.
    async fn list_page(
        &self,
        max_keys: usize,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, StorageError>;

    /// Issue a signed GET URL for `key` that expires after `expires_in`.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError>;
}
