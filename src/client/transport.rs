//! HTTP transport for the gallery client.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use tracing::debug;
use url::Url;

use crate::error::ClientError;
use crate::protocol::{ImageRecord, DEFAULT_FILE_NAME};

/// Raw body of one listing response.
pub type ByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// Opens listing pages for the gallery controller.
///
/// [`GalleryClient`] is the HTTP implementation; tests script the body
/// chunks directly.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Request the page starting at `cursor` and return its body as chunks.
    async fn open_page(&self, cursor: Option<&str>) -> Result<ByteStream, ClientError>;
}

/// An image fetched through the download proxy.
#[derive(Debug, Clone)]
pub struct DownloadedImage {
    /// Name suggested by `Content-Disposition`
    pub file_name: String,

    pub content_type: Option<String>,

    pub data: Bytes,
}

/// HTTP client for a gallery server.
///
/// # Example
///
/// ```ignore
/// use gallery_streamer::client::{GalleryClient, GalleryController};
///
/// let client = GalleryClient::new("http://localhost:3000")?;
/// let gallery = GalleryController::new(client);
/// gallery.load_more().await;
/// ```
#[derive(Clone)]
pub struct GalleryClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GalleryClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        Ok(Self::with_http_client(reqwest::Client::new(), base_url))
    }

    /// Create a client that reuses an existing `reqwest::Client`.
    pub fn with_http_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the listing endpoint for the page at `cursor`.
    pub fn images_url(&self, cursor: Option<&str>) -> Result<Url, ClientError> {
        let mut url = self
            .base_url
            .join("/api/images")
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

        if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
            url.query_pairs_mut()
                .append_pair("continuationToken", cursor);
        }

        Ok(url)
    }

    /// URL of the download proxy for `image`.
    pub fn download_url(&self, image: &ImageRecord) -> Result<Url, ClientError> {
        let mut url = self
            .base_url
            .join("/api/download")
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

        let file_name = if image.file_name.is_empty() {
            DEFAULT_FILE_NAME
        } else {
            &image.file_name
        };

        url.query_pairs_mut()
            .append_pair("url", &image.url)
            .append_pair("fileName", file_name);

        Ok(url)
    }

    /// Fetch an image through the server's download proxy.
    pub async fn download(&self, image: &ImageRecord) -> Result<DownloadedImage, ClientError> {
        let url = self.download_url(image)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_file_name)
            .unwrap_or_else(|| image.file_name.clone());

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let data = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(DownloadedImage {
            file_name,
            content_type,
            data,
        })
    }
}

#[async_trait]
impl PageSource for GalleryClient {
    async fn open_page(&self, cursor: Option<&str>) -> Result<ByteStream, ClientError> {
        let url = self.images_url(cursor)?;
        debug!(url = %url, "Requesting image page");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ClientError::Transport(e.to_string())))
            .boxed())
    }
}

/// Extract the file name of a `Content-Disposition` value.
///
/// Prefers the RFC 5987 `filename*` form over the ASCII `filename` fallback.
fn attachment_file_name(header: &str) -> Option<String> {
    let params: Vec<&str> = header.split(';').map(str::trim).collect();

    let extended = params.iter().find_map(|param| {
        let value = param.strip_prefix("filename*=")?;
        let encoded = value.strip_prefix("UTF-8''")?;
        urlencoding::decode(encoded).ok().map(|v| v.into_owned())
    });

    extended
        .or_else(|| {
            params.iter().find_map(|param| {
                let value = param.strip_prefix("filename=")?;
                Some(value.trim_matches('"').to_string())
            })
        })
        .filter(|name| !name.is_empty())
}
