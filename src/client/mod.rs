//! Gallery client.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           GalleryController             │
//! │  state (watch) · cursor · single-flight │
//! │        ┌──────────┐  ┌─────────────┐    │
//! │        │ Sentinel │  │ LineDecoder │    │
//! │        └──────────┘  └─────────────┘    │
//! └────────────────────┬────────────────────┘
//!                      │ PageSource
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │   GalleryClient (reqwest, /api/images)  │
//! └─────────────────────────────────────────┘
//! ```

mod controller;
mod sentinel;
mod transport;

pub use controller::{GalleryController, GalleryState, LoadOutcome};
pub use sentinel::{Sentinel, SentinelBox, Viewport, DEFAULT_ROOT_MARGIN};
pub use transport::{ByteStream, DownloadedImage, GalleryClient, PageSource};
