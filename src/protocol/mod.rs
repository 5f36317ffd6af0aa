//! Wire contract between the listing service and the gallery client.
//!
//! A page request is answered with newline-delimited JSON [`StreamEvent`]s:
//! zero or more `processing` events followed by exactly one terminal
//! `complete` or `error` event.

mod codec;
mod event;

pub use codec::{decode_line, encode_event, LineDecoder};
pub use event::{ImageRecord, Progress, StreamEvent};

/// Download name used when an image carries no file name.
pub const DEFAULT_FILE_NAME: &str = "image.png";
