use thiserror::Error;

/// Errors returned by the object storage backend
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Bucket does not exist or is not visible with the configured credentials
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Signing an access URL for an object failed
    #[error("Failed to sign URL for {key}: {message}")]
    Presign { key: String, message: String },
}

/// Errors that end a gallery page load.
///
/// The `Display` text is what the gallery shows to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The load was aborted through its cancellation token
    #[error("Request was cancelled")]
    Cancelled,

    /// The listing endpoint answered with a non-success status
    #[error("Network response was not ok (status {0})")]
    Status(u16),

    /// Connection failure or broken response body
    #[error("{0}")]
    Transport(String),

    /// Terminal `error` event sent by the listing service
    #[error("{0}")]
    Server(String),

    /// The body ended without a `complete` or `error` event
    #[error("Stream ended before the page completed")]
    Incomplete,

    /// The base URL could not be parsed or joined
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors from the download proxy endpoint
#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    /// No `url` query parameter was given (maps to HTTP 400)
    #[error("Image URL is required")]
    MissingUrl,

    /// The upstream fetch failed before a response arrived
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// The upstream answered with a non-success status
    #[error("Upstream returned status {0}")]
    UpstreamStatus(u16),
}
