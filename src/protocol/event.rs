//! Stream event types shared by the listing service and the gallery client.

use serde::{Deserialize, Serialize};

/// One object exposed to the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Content checksum when the backend reports one, otherwise the storage key
    pub id: String,

    /// Storage key, used as display name and default download name
    pub file_name: String,

    /// Time-limited signed URL
    pub url: String,
}

/// Progress counters for the URL-signing batches of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Page entries handled so far (signed or skipped)
    pub processed: usize,

    /// Number of entries in the page
    pub total: usize,
}

/// One line of the listing response.
///
/// Serialized with an internal `status` tag:
///
/// ```json
/// {"status":"processing","progress":{"processed":5,"total":20}}
/// {"status":"complete","images":[...],"hasMore":true,"continuationToken":"..."}
/// {"status":"error","error":"Failed to process images"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StreamEvent {
    Processing {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress: Option<Progress>,
    },

    #[serde(rename_all = "camelCase")]
    Complete {
        #[serde(default)]
        images: Vec<ImageRecord>,

        #[serde(default)]
        has_more: bool,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        continuation_token: Option<String>,
    },

    Error {
        #[serde(default = "unknown_error")]
        error: String,
    },
}

fn unknown_error() -> String {
    "Unknown error occurred".to_string()
}

impl StreamEvent {
    /// The bare `processing` marker sent before any backend I/O.
    pub fn started() -> Self {
        StreamEvent::Processing { progress: None }
    }

    pub fn progress(processed: usize, total: usize) -> Self {
        StreamEvent::Processing {
            progress: Some(Progress { processed, total }),
        }
    }

    pub fn complete(
        images: Vec<ImageRecord>,
        has_more: bool,
        continuation_token: Option<String>,
    ) -> Self {
        StreamEvent::Complete {
            images,
            has_more,
            continuation_token,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            error: message.into(),
        }
    }

    /// Whether this event ends the page (`complete` or `error`).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Processing { .. })
    }
}
