//! Gallery controller: owns the client-side gallery state and drives page
//! loads against a [`PageSource`].
//!
//! # Load lifecycle
//!
//! ```text
//!   on_scroll ──► sentinel near? ──► load_more
//!                                       │
//!             guard: !loading && has_next_page (atomic claim)
//!                                       │
//!             open_page(cursor) ──► chunks ──► LineDecoder ──► events
//!                                       │
//!     processing → progress   complete → append images, cursor, has_next_page
//!     error      → fail       malformed line → warn + skip
//!                                       │
//!             always: loading = false, progress = None
//! ```
//!
//! Cancellation is cooperative. [`GalleryController::cancel`] aborts the
//! in-flight load and [`GalleryController::teardown`] additionally refuses all
//! later loads. Once a load is aborted none of its events touch the images,
//! progress or `has_next_page`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::protocol::{decode_line, ImageRecord, LineDecoder, Progress, StreamEvent};

use super::sentinel::{Sentinel, SentinelBox, Viewport};
use super::transport::PageSource;

/// Observable gallery state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryState {
    /// Every image received so far, in arrival order
    pub images: Vec<ImageRecord>,

    /// A page load is in flight
    pub loading: bool,

    /// Message of the last failed load, cleared when a new load starts
    pub error: Option<String>,

    /// Whether the server reported more pages
    pub has_next_page: bool,

    /// Signing progress of the page being loaded
    pub progress: Option<Progress>,
}

impl Default for GalleryState {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            loading: false,
            error: None,
            has_next_page: true,
            progress: None,
        }
    }
}

/// Result of one call to [`GalleryController::load_more`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was requested: a load is in flight, the gallery is exhausted,
    /// the sentinel is out of range or the controller was torn down.
    Skipped,

    /// A page was appended.
    Loaded { added: usize, has_more: bool },

    /// The load failed; the message is in [`GalleryState::error`].
    Failed(ClientError),

    /// The load was aborted.
    Cancelled,
}

struct PageSummary {
    added: usize,
    has_more: bool,
}

/// Drives an infinite-scroll gallery.
///
/// The controller may be shared (`Arc`) across tasks; at most one page load
/// runs at a time regardless of how many callers trigger one.
pub struct GalleryController<P: PageSource> {
    source: P,
    sentinel: Sentinel,
    state: watch::Sender<GalleryState>,

    /// Cursor for the next page; read at request time only
    cursor: Mutex<Option<String>>,

    /// Single-flight flag for page loads
    in_flight: AtomicBool,

    /// Abort handle of the in-flight load
    abort: Mutex<Option<CancellationToken>>,

    /// Cancelled on teardown; every load token is a child of it
    shutdown: CancellationToken,
}

impl<P: PageSource> GalleryController<P> {
    /// Create a controller with the default 400px prefetch margin.
    pub fn new(source: P) -> Self {
        Self::with_sentinel(source, Sentinel::default())
    }

    pub fn with_sentinel(source: P, sentinel: Sentinel) -> Self {
        let (state, _) = watch::channel(GalleryState::default());
        Self {
            source,
            sentinel,
            state,
            cursor: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            abort: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> GalleryState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<GalleryState> {
        self.state.subscribe()
    }

    /// Cursor the next load will send.
    pub fn cursor(&self) -> Option<String> {
        lock(&self.cursor).clone()
    }

    /// Whether a page load is currently claimed.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether [`teardown`](Self::teardown) was called.
    pub fn is_torn_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Schedule a load if the sentinel is within range of the viewport.
    pub async fn on_scroll(&self, viewport: Viewport, sentinel: SentinelBox) -> LoadOutcome {
        if !self.sentinel.in_view(viewport, sentinel) {
            return LoadOutcome::Skipped;
        }
        self.load_more().await
    }

    /// Load the next page.
    ///
    /// No-op when a load is already in flight or the server reported no
    /// further pages. On failure `has_next_page` is left untouched so the
    /// next trigger retries the same cursor.
    pub async fn load_more(&self) -> LoadOutcome {
        if self.shutdown.is_cancelled() {
            return LoadOutcome::Skipped;
        }

        let has_next_page = self.state.borrow().has_next_page;
        if !has_next_page {
            return LoadOutcome::Skipped;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Page load already in flight");
            return LoadOutcome::Skipped;
        }
        let _guard = FlightGuard { controller: self };

        // The previous load may have exhausted the gallery after our first check
        let has_next_page = self.state.borrow().has_next_page;
        if !has_next_page {
            return LoadOutcome::Skipped;
        }

        let token = self.shutdown.child_token();
        *lock(&self.abort) = Some(token.clone());

        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let cursor = lock(&self.cursor).clone();

        match self.read_page(cursor.as_deref(), &token).await {
            Ok(page) => {
                info!(
                    added = page.added,
                    has_more = page.has_more,
                    "Loaded image page"
                );
                LoadOutcome::Loaded {
                    added: page.added,
                    has_more: page.has_more,
                }
            }
            Err(ClientError::Cancelled) => {
                info!("Page load cancelled");
                self.fail(&ClientError::Cancelled);
                LoadOutcome::Cancelled
            }
            Err(e) => {
                warn!(error = %e, "Page load failed");
                self.fail(&e);
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Abort the in-flight load, if any.
    pub fn cancel(&self) {
        let token = lock(&self.abort).clone();
        if let Some(token) = token {
            self.cancel_token(&token);
        }
    }

    /// Abort the in-flight load and refuse all further loads.
    pub fn teardown(&self) {
        self.cancel_token(&self.shutdown);
    }

    fn cancel_token(&self, token: &CancellationToken) {
        // Cancelling under the state lock orders the abort against updates
        // from a load running on another thread.
        self.state.send_if_modified(|_| {
            token.cancel();
            false
        });
    }

    async fn read_page(
        &self,
        cursor: Option<&str>,
        token: &CancellationToken,
    ) -> Result<PageSummary, ClientError> {
        let mut body = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ClientError::Cancelled),
            opened = self.source.open_page(cursor) => opened?,
        };

        let mut decoder = LineDecoder::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(ClientError::Cancelled),
                next = body.next() => next,
            };

            let (lines, finished) = match next {
                Some(chunk) => (decoder.push(&chunk?), false),
                None => (decoder.finish().into_iter().collect(), true),
            };

            for line in &lines {
                if let Some(page) = self.apply_line(line, token)? {
                    return Ok(page);
                }
            }

            if finished {
                return Err(ClientError::Incomplete);
            }
        }
    }

    /// Dispatch one line. Returns the page summary on `complete`.
    fn apply_line(
        &self,
        line: &str,
        token: &CancellationToken,
    ) -> Result<Option<PageSummary>, ClientError> {
        let event = match decode_line(line) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, line = %line, "Skipping malformed stream line");
                return Ok(None);
            }
        };

        match event {
            StreamEvent::Processing {
                progress: Some(progress),
            } => {
                self.update(token, |state| state.progress = Some(progress))?;
                Ok(None)
            }
            StreamEvent::Processing { progress: None } => Ok(None),
            StreamEvent::Complete {
                images,
                has_more,
                continuation_token,
            } => {
                let added = images.len();
                self.update(token, |state| {
                    state.images.extend(images);
                    state.has_next_page = has_more;
                    *lock(&self.cursor) = continuation_token;
                })?;
                Ok(Some(PageSummary { added, has_more }))
            }
            StreamEvent::Error { error } => Err(ClientError::Server(error)),
        }
    }

    /// Apply `update` unless the load has been aborted.
    fn update(
        &self,
        token: &CancellationToken,
        update: impl FnOnce(&mut GalleryState),
    ) -> Result<(), ClientError> {
        let mut cancelled = false;
        self.state.send_if_modified(|state| {
            if token.is_cancelled() {
                cancelled = true;
                return false;
            }
            update(state);
            true
        });

        if cancelled {
            Err(ClientError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn fail(&self, error: &ClientError) {
        let message = error.to_string();
        self.state.send_modify(|state| state.error = Some(message));
    }
}

/// Releases the single-flight claim and clears transient state, including
/// when the load future is dropped mid-way.
struct FlightGuard<'a, P: PageSource> {
    controller: &'a GalleryController<P>,
}

impl<P: PageSource> Drop for FlightGuard<'_, P> {
    fn drop(&mut self) {
        lock(&self.controller.abort).take();
        self.controller.state.send_if_modified(|state| {
            let changed = state.loading || state.progress.is_some();
            state.loading = false;
            state.progress = None;
            changed
        });
        self.controller.in_flight.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
