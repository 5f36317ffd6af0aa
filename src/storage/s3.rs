//! S3-backed object store.
//!
//! Works against AWS S3 and S3-compatible services (Backblaze B2, MinIO, ...).

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use tracing::debug;

use super::{ObjectEntry, ObjectPage, ObjectStore};
use crate::error::StorageError;

/// S3 implementation of [`ObjectStore`] for a single bucket.
///
/// # Example
///
/// ```ignore
/// use gallery_streamer::storage::{create_s3_client, S3ObjectStore};
///
/// let client = create_s3_client(None, "us-east-1", None).await;
/// let store = S3ObjectStore::new(client, "my-images".to_string());
/// let page = store.list_page(20, None).await?;
/// ```
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_page(
        &self,
        max_keys: usize,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, StorageError> {
        let max_keys = i32::try_from(max_keys).unwrap_or(i32::MAX);

        let result = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(max_keys)
            .set_continuation_token(continuation_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                let no_such_bucket = e
                    .as_service_error()
                    .map(|se| se.is_no_such_bucket())
                    .unwrap_or(false);

                if no_such_bucket {
                    return StorageError::BucketNotFound(self.bucket.clone());
                }

                match &e {
                    SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
                        StorageError::Connection(e.to_string())
                    }
                    _ => StorageError::S3(e.to_string()),
                }
            })?;

        let objects: Vec<ObjectEntry> = result
            .contents()
            .iter()
            .map(|obj| ObjectEntry {
                key: obj.key().map(str::to_string),
                etag: obj.e_tag().map(str::to_string),
            })
            .collect();

        debug!(
            bucket = %self.bucket,
            objects = objects.len(),
            truncated = result.is_truncated().unwrap_or(false),
            "Listed bucket page"
        );

        Ok(ObjectPage {
            objects,
            is_truncated: result.is_truncated().unwrap_or(false),
            next_continuation_token: result.next_continuation_token().map(str::to_string),
        })
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        let presign_error = |message: String| StorageError::Presign {
            key: key.to_string(),
            message,
        };

        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| presign_error(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| presign_error(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}

/// Endpoint URL of the Backblaze B2 S3-compatible API for a region.
///
/// ```
/// use gallery_streamer::storage::backblaze_endpoint;
///
/// assert_eq!(
///     backblaze_endpoint("us-east-005"),
///     "https://s3.us-east-005.backblazeb2.com"
/// );
/// ```
pub fn backblaze_endpoint(region: &str) -> String {
    format!("https://s3.{}.backblazeb2.com", region)
}

/// Create an S3 client with optional custom endpoint and static credentials.
///
/// Without `credentials` the default AWS provider chain is used (environment,
/// profile, instance metadata). A custom endpoint switches to path-style
/// addressing, which S3-compatible services generally expect.
pub async fn create_s3_client(
    endpoint_url: Option<&str>,
    region: &str,
    credentials: Option<Credentials>,
) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    if let Some(credentials) = credentials {
        config_loader = config_loader.credentials_provider(credentials);
    }

    let sdk_config = config_loader.load().await;

    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}
