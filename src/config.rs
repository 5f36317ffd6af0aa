//! Configuration management for Gallery Streamer.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap, with one subcommand per mode
//! - Environment variables with `GALLERY_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use gallery_streamer::config::{Cli, Command};
//!
//! match Cli::parse().command {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Check(config) => println!("Checking bucket {}", config.s3.bucket),
//!     Command::Browse(config) => println!("Browsing {}", config.server),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `GALLERY_HOST` - Server bind address (default: 0.0.0.0)
//! - `GALLERY_PORT` - Server port (default: 3000)
//! - `GALLERY_S3_BUCKET` - Bucket holding the images (required)
//! - `GALLERY_S3_ENDPOINT` - Custom endpoint for S3-compatible services
//! - `GALLERY_S3_REGION` - Storage region (default: us-east-1)
//! - `GALLERY_BACKBLAZE` - Derive the Backblaze B2 endpoint from the region
//! - `GALLERY_ACCESS_KEY_ID` / `GALLERY_SECRET_ACCESS_KEY` - Static credentials
//! - `GALLERY_PAGE_SIZE` - Objects per listing page (default: 20)
//! - `GALLERY_BATCH_SIZE` - Concurrent URL signings (default: 5)
//! - `GALLERY_URL_EXPIRY` - Signed URL lifetime in seconds (default: 3600)
//! - `GALLERY_DOWNLOAD_TIMEOUT` - Download proxy timeout in seconds (default: 30)
//! - `GALLERY_CORS_ORIGINS` - Allowed CORS origins, comma-separated
//! - `GALLERY_TITLE` - Gallery page title
//! - `GALLERY_SERVER_URL` - Server used by `browse` (default: http://localhost:3000)

use std::path::PathBuf;
use std::time::Duration;

use aws_sdk_s3::config::Credentials;
use clap::{Args, Parser, Subcommand};

use crate::listing::{ListingOptions, DEFAULT_BATCH_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_URL_EXPIRY};
use crate::server::DEFAULT_GALLERY_TITLE;
use crate::storage::backblaze_endpoint;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default storage region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Largest page the S3 listing API returns.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Longest lifetime SigV4 presigned URLs accept (7 days).
pub const MAX_URL_EXPIRY_SECS: u64 = 604_800;

/// Default download proxy timeout in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// Default server for the `browse` command.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Default grid width used by `browse` to lay out images.
pub const DEFAULT_BROWSE_COLUMNS: usize = 4;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Gallery Streamer - An infinite-scroll image gallery over S3.
///
/// Lists a bucket page by page and streams time-limited signed image URLs to
/// the browser as newline-delimited JSON.
#[derive(Parser, Debug, Clone)]
#[command(name = "gallery-streamer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the gallery server
    Serve(ServeConfig),

    /// Validate configuration and test bucket connectivity
    Check(CheckConfig),

    /// Page through a running server with the gallery client
    Browse(BrowseConfig),
}

/// Storage connection settings shared by `serve` and `check`.
#[derive(Args, Debug, Clone)]
pub struct S3Args {
    /// Bucket holding the gallery images.
    #[arg(long, env = "GALLERY_S3_BUCKET")]
    pub bucket: String,

    /// Custom endpoint URL for S3-compatible services (MinIO, B2, etc.).
    #[arg(long, env = "GALLERY_S3_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Storage region.
    #[arg(long, default_value = DEFAULT_REGION, env = "GALLERY_S3_REGION")]
    pub region: String,

    /// Use the Backblaze B2 endpoint for `--region` when no endpoint is given.
    #[arg(long, default_value_t = false, env = "GALLERY_BACKBLAZE")]
    pub backblaze: bool,

    /// Access key id. Without it the default AWS credential chain is used.
    #[arg(long, env = "GALLERY_ACCESS_KEY_ID")]
    pub access_key_id: Option<String>,

    /// Secret access key paired with `--access-key-id`.
    #[arg(long, env = "GALLERY_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,
}

impl S3Args {
    /// Validate the storage settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.bucket.is_empty() {
            return Err("Bucket name is required. Set --bucket or GALLERY_S3_BUCKET".to_string());
        }

        if self.region.is_empty() {
            return Err("Region must not be empty".to_string());
        }

        match (&self.access_key_id, &self.secret_access_key) {
            (Some(_), None) | (None, Some(_)) => Err(
                "--access-key-id and --secret-access-key must be given together".to_string(),
            ),
            _ => Ok(()),
        }
    }

    /// Effective endpoint: the explicit one, else the B2 endpoint if requested.
    pub fn endpoint(&self) -> Option<String> {
        match &self.endpoint {
            Some(endpoint) => Some(endpoint.clone()),
            None if self.backblaze => Some(backblaze_endpoint(&self.region)),
            None => None,
        }
    }

    /// Static credentials, if both halves were configured.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Some(Credentials::new(
                id,
                secret,
                None,
                None,
                "gallery-streamer",
            )),
            _ => None,
        }
    }
}

/// Options for `gallery-streamer serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "GALLERY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "GALLERY_PORT")]
    pub port: u16,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    #[command(flatten)]
    pub s3: S3Args,

    // =========================================================================
    // Listing Configuration
    // =========================================================================
    /// Objects per listing page (1-1000).
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, env = "GALLERY_PAGE_SIZE")]
    pub page_size: usize,

    /// Number of URLs signed concurrently per batch.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, env = "GALLERY_BATCH_SIZE")]
    pub batch_size: usize,

    /// Signed URL lifetime in seconds (1-604800).
    #[arg(long, default_value_t = DEFAULT_URL_EXPIRY.as_secs(), env = "GALLERY_URL_EXPIRY")]
    pub url_expiry: u64,

    /// Timeout in seconds for upstream fetches of the download proxy.
    #[arg(long, default_value_t = DEFAULT_DOWNLOAD_TIMEOUT_SECS, env = "GALLERY_DOWNLOAD_TIMEOUT")]
    pub download_timeout: u64,

    // =========================================================================
    // HTTP Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "GALLERY_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Title of the gallery page.
    #[arg(long, default_value = DEFAULT_GALLERY_TITLE, env = "GALLERY_TITLE")]
    pub title: String,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.s3.validate()?;

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(format!("page_size must be between 1 and {}", MAX_PAGE_SIZE));
        }

        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }

        if self.url_expiry == 0 || self.url_expiry > MAX_URL_EXPIRY_SECS {
            return Err(format!(
                "url_expiry must be between 1 and {} seconds",
                MAX_URL_EXPIRY_SECS
            ));
        }

        if self.download_timeout == 0 {
            return Err("download_timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Listing options derived from the page, batch and expiry settings.
    pub fn listing_options(&self) -> ListingOptions {
        ListingOptions::default()
            .with_page_size(self.page_size)
            .with_batch_size(self.batch_size)
            .with_url_expiry(Duration::from_secs(self.url_expiry))
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout)
    }
}

/// Options for `gallery-streamer check`.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    #[command(flatten)]
    pub s3: S3Args,

    /// Print the keys of the first listing page.
    #[arg(long, default_value_t = false)]
    pub list: bool,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Options for `gallery-streamer browse`.
#[derive(Args, Debug, Clone)]
pub struct BrowseConfig {
    /// Base URL of a running gallery server.
    #[arg(long, default_value = DEFAULT_SERVER_URL, env = "GALLERY_SERVER_URL")]
    pub server: String,

    /// Stop after this many pages.
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Save every listed image into this directory.
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// Images per row of the simulated grid.
    #[arg(long, default_value_t = DEFAULT_BROWSE_COLUMNS)]
    pub columns: usize,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl BrowseConfig {
    pub fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.server).map_err(|e| format!("Invalid server URL: {}", e))?;

        if self.max_pages == Some(0) {
            return Err("max_pages must be greater than 0".to_string());
        }

        if self.columns == 0 {
            return Err("columns must be greater than 0".to_string());
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
