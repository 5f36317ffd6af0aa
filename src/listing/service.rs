//! Listing Service: turns one bucket page into a stream of events.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   ListingService::stream_page()              │
//! │                                                              │
//! │  processing ──► list_page(token) ──► empty? ──► complete([]) │
//! │                        │                                     │
//! │                        ▼                                     │
//! │        ┌───────── batches of N keys ─────────┐               │
//! │        │ presign ║ presign ║ ... (join)      │ ──► progress  │
//! │        └─────────────────────────────────────┘               │
//! │                        │ (next batch)                        │
//! │                        ▼                                     │
//! │               complete(images, hasMore, token)               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any storage failure ends the stream with a single `error` event.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::future::try_join_all;
use futures::Stream;
use tracing::{debug, error, info};

use crate::error::StorageError;
use crate::protocol::{ImageRecord, StreamEvent};
use crate::storage::{ObjectEntry, ObjectStore};

/// Default number of keys requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Default number of URLs signed concurrently.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Default lifetime of signed URLs (1 hour).
pub const DEFAULT_URL_EXPIRY: Duration = Duration::from_secs(3600);

/// Message of the terminal `error` event. Backend details are only logged.
pub const LISTING_FAILURE_MESSAGE: &str = "Failed to process images";

/// Tuning knobs for the listing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingOptions {
    /// Maximum keys per page
    pub page_size: usize,

    /// Keys signed concurrently within one batch
    pub batch_size: usize,

    /// Lifetime of each signed URL
    pub url_expiry: Duration,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            url_expiry: DEFAULT_URL_EXPIRY,
        }
    }
}

impl ListingOptions {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_url_expiry(mut self, url_expiry: Duration) -> Self {
        self.url_expiry = url_expiry;
        self
    }
}

/// Streams pages of signed image URLs from an [`ObjectStore`].
///
/// The service holds no per-request state; every call to
/// [`stream_page`](Self::stream_page) is independent.
///
/// # Example
///
/// ```ignore
/// use futures::StreamExt;
///
/// let service = ListingService::new(store);
/// let mut events = std::pin::pin!(service.stream_page(None));
/// while let Some(event) = events.next().await {
///     println!("{:?}", event);
/// }
/// ```
pub struct ListingService<S: ObjectStore> {
    store: Arc<S>,
    options: ListingOptions,
}

impl<S: ObjectStore + 'static> ListingService<S> {
    /// Create a service with default page size, batch size and URL expiry.
    pub fn new(store: S) -> Self {
        Self::with_options(store, ListingOptions::default())
    }

    pub fn with_options(store: S, options: ListingOptions) -> Self {
        Self {
            store: Arc::new(store),
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &ListingOptions {
        &self.options
    }

    /// Stream the events for one page.
    ///
    /// The stream is lazy: nothing is requested from the backend until it is
    /// polled, and dropping it (client disconnect) stops further batches.
    /// It always ends right after its terminal event.
    pub fn stream_page(
        &self,
        continuation_token: Option<String>,
    ) -> impl Stream<Item = StreamEvent> + Send + 'static {
        let store = Arc::clone(&self.store);
        let options = self.options.clone();
        let batch_size = options.batch_size.max(1);

        stream! {
            yield StreamEvent::started();

            let page = match store
                .list_page(options.page_size, continuation_token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    error!(error = %e, "Failed to list objects");
                    yield StreamEvent::failure(LISTING_FAILURE_MESSAGE);
                    return;
                }
            };

            if page.objects.is_empty() {
                debug!("Bucket page is empty");
                yield StreamEvent::complete(Vec::new(), false, None);
                return;
            }

            let total = page.objects.len();
            let mut images = Vec::with_capacity(total);
            let mut processed = 0;

            for batch in page.objects.chunks(batch_size) {
                match sign_batch(store.as_ref(), batch, options.url_expiry).await {
                    Ok(signed) => images.extend(signed),
                    Err(e) => {
                        error!(
                            error = %e,
                            processed = processed,
                            total = total,
                            "Failed to sign image URLs"
                        );
                        yield StreamEvent::failure(LISTING_FAILURE_MESSAGE);
                        return;
                    }
                }

                processed += batch.len();
                yield StreamEvent::progress(processed, total);
            }

            info!(
                objects = total,
                images = images.len(),
                has_more = page.is_truncated,
                "Listed image page"
            );

            yield StreamEvent::complete(images, page.is_truncated, page.next_continuation_token);
        }
    }
}

/// Sign every key of a batch concurrently. Entries without a key are skipped.
async fn sign_batch<S: ObjectStore + ?Sized>(
    store: &S,
    batch: &[ObjectEntry],
    expiry: Duration,
) -> Result<Vec<ImageRecord>, StorageError> {
    let signed = try_join_all(batch.iter().map(|entry| sign_entry(store, entry, expiry))).await?;
    Ok(signed.into_iter().flatten().collect())
}

async fn sign_entry<S: ObjectStore + ?Sized>(
    store: &S,
    entry: &ObjectEntry,
    expiry: Duration,
) -> Result<Option<ImageRecord>, StorageError> {
    let Some(key) = entry.key.as_deref() else {
        return Ok(None);
    };

    let url = store.presign_get(key, expiry).await?;

    Ok(Some(ImageRecord {
        id: entry.image_id().unwrap_or_else(|| key.to_string()),
        file_name: key.to_string(),
        url,
    }))
}
