//! Gallery Streamer - An infinite-scroll image gallery over S3.
//!
//! This binary starts the HTTP server, checks storage configuration, or
//! browses a running server with the Rust gallery client.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gallery_streamer::{
    config::{BrowseConfig, CheckConfig, Cli, Command, S3Args, ServeConfig},
    create_router, create_s3_client, GalleryClient, GalleryController, ImageRecord,
    ListingService, LoadOutcome, ObjectStore, RouterConfig, S3ObjectStore, SentinelBox, Viewport,
};

/// Height of the simulated browser window used by `browse`.
const BROWSE_VIEWPORT_HEIGHT: f64 = 800.0;

/// Height of one grid row in the simulated layout.
const BROWSE_ROW_HEIGHT: f64 = 240.0;

const BROWSE_SENTINEL_HEIGHT: f64 = 40.0;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
        Command::Browse(config) => run_browse(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    print_banner();

    let endpoint = config.s3.endpoint();

    info!("Configuration:");
    info!("  Bucket: {}", config.s3.bucket);
    if let Some(ref endpoint) = endpoint {
        info!("  Endpoint: {}", endpoint);
    }
    info!("  Region: {}", config.s3.region);
    info!(
        "  Listing: {} objects/page, {} concurrent signatures, URLs valid {}s",
        config.page_size, config.batch_size, config.url_expiry
    );

    let store = connect_store(&config.s3, endpoint.as_deref()).await;

    info!("");
    info!("Connecting to storage...");
    match store.list_page(1, None).await {
        Ok(page) => {
            info!("  Connected successfully");
            if page.objects.is_empty() {
                info!("  Bucket is empty");
            }
        }
        Err(e) => {
            error!("  Failed to connect to storage: {}", e);
            error!("");
            error!("  Please check:");
            error!("    - Your credentials are configured correctly");
            error!(
                "    - The bucket '{}' exists and is accessible",
                config.s3.bucket
            );
            error!("    - The endpoint is correct (if using MinIO/B2/custom S3)");
            return ExitCode::FAILURE;
        }
    }

    let listing = ListingService::with_options(store, config.listing_options());

    let http_client = match reqwest::Client::builder()
        .timeout(config.download_timeout())
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create download client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let router = create_router(listing, build_router_config(&config, http_client));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Open the gallery in your browser:");
    info!("    open http://{}/", addr);
    info!("");
    info!("  Stream the first page:");
    info!("    curl -N http://{}/api/images", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!(" ██████╗  █████╗ ██╗     ██╗     ███████╗██████╗ ██╗   ██╗");
    info!("██╔════╝ ██╔══██╗██║     ██║     ██╔════╝██╔══██╗╚██╗ ██╔╝");
    info!("██║  ███╗███████║██║     ██║     █████╗  ██████╔╝ ╚████╔╝ ");
    info!("██║   ██║██╔══██║██║     ██║     ██╔══╝  ██╔══██╗  ╚██╔╝  ");
    info!("╚██████╔╝██║  ██║███████╗███████╗███████╗██║  ██║   ██║   ");
    info!(" ╚═════╝ ╚═╝  ╚═╝╚══════╝╚══════╝╚══════╝╚═╝  ╚═╝   ╚═╝   ");
    info!("");
    info!("                    streamer v{}", version);
}

async fn connect_store(s3: &S3Args, endpoint: Option<&str>) -> S3ObjectStore {
    let client = create_s3_client(endpoint, &s3.region, s3.credentials()).await;
    S3ObjectStore::new(client, s3.bucket.clone())
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "gallery_streamer=debug,tower_http=debug"
    } else {
        "gallery_streamer=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig, http_client: reqwest::Client) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_gallery_title(config.title.clone())
        .with_http_client(http_client)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("Gallery Streamer Configuration Check");
    println!("════════════════════════════════════");
    println!();

    if let Err(e) = config.s3.validate() {
        println!("✗ Configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let endpoint = config.s3.endpoint();

    println!("✓ Bucket: {}", config.s3.bucket);
    if let Some(ref endpoint) = endpoint {
        println!("✓ Endpoint: {}", endpoint);
    }
    println!("✓ Region: {}", config.s3.region);
    if config.s3.credentials().is_some() {
        println!("✓ Credentials: static access key");
    } else {
        println!("✓ Credentials: default provider chain");
    }
    println!();

    print!("Testing storage connection... ");

    let store = connect_store(&config.s3, endpoint.as_deref()).await;

    let page = match store.list_page(gallery_streamer::listing::DEFAULT_PAGE_SIZE, None).await {
        Ok(page) => {
            println!("✓ success");
            page
        }
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Please check:");
            println!("  - Your credentials are configured correctly");
            println!(
                "  - The bucket '{}' exists and is accessible",
                config.s3.bucket
            );
            if endpoint.is_some() {
                println!("  - The endpoint is correct and reachable");
            }
            return ExitCode::FAILURE;
        }
    };

    if config.list {
        println!();
        println!("First page of objects:");
        println!("──────────────────────");

        let keys: Vec<&str> = page
            .objects
            .iter()
            .filter_map(|object| object.key.as_deref())
            .collect();

        if keys.is_empty() {
            println!("  (no objects found)");
        } else {
            for key in &keys {
                println!("  {}", key);
            }
            println!();
            if page.is_truncated {
                println!("Showing {} object(s); more pages available", keys.len());
            } else {
                println!("Total: {} object(s)", keys.len());
            }
        }
    }

    println!();
    println!("════════════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}

// =============================================================================
// Browse Command
// =============================================================================

async fn run_browse(config: BrowseConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let client = match GalleryClient::new(&config.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref dir) = config.download_dir {
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            eprintln!("Error: cannot create {}: {}", dir.display(), e);
            return ExitCode::FAILURE;
        }
    }

    let gallery = Arc::new(GalleryController::new(client));

    // Progress reporter
    let mut updates = gallery.subscribe();
    let reporter = tokio::spawn(async move {
        let mut last = None;
        while updates.changed().await.is_ok() {
            let progress = updates.borrow_and_update().progress;
            if let Some(p) = progress.filter(|_| progress != last) {
                println!("  Processing images: {} / {}", p.processed, p.total);
            }
            last = progress;
        }
    });

    let interrupt = tokio::spawn({
        let gallery = Arc::clone(&gallery);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                gallery.teardown();
            }
        }
    });

    println!("Browsing {}", config.server);
    println!();

    let mut exit = ExitCode::SUCCESS;
    let mut pages = 0;
    let mut viewport_top = 0.0;

    loop {
        let state = gallery.state();
        let rows = state.images.len().div_ceil(config.columns);
        let sentinel = SentinelBox::new(rows as f64 * BROWSE_ROW_HEIGHT, BROWSE_SENTINEL_HEIGHT);
        let viewport = Viewport::new(viewport_top, BROWSE_VIEWPORT_HEIGHT);

        match gallery.on_scroll(viewport, sentinel).await {
            LoadOutcome::Loaded { added, has_more } => {
                pages += 1;
                let state = gallery.state();
                let new_images = &state.images[state.images.len() - added..];

                println!("Page {}: {} image(s)", pages, added);
                for image in new_images {
                    println!("  {}", image.file_name);
                    if let Some(ref dir) = config.download_dir {
                        save_image(gallery.source(), image, dir).await;
                    }
                }

                if !has_more || config.max_pages.is_some_and(|max| pages >= max) {
                    break;
                }
            }
            LoadOutcome::Skipped => {
                if gallery.is_torn_down() || !gallery.state().has_next_page {
                    break;
                }
                // Sentinel out of range: scroll down one screen
                viewport_top += BROWSE_VIEWPORT_HEIGHT;
            }
            LoadOutcome::Cancelled => {
                println!();
                println!("Interrupted");
                exit = ExitCode::FAILURE;
                break;
            }
            LoadOutcome::Failed(e) => {
                eprintln!();
                eprintln!("Error: {}", e);
                exit = ExitCode::FAILURE;
                break;
            }
        }
    }

    interrupt.abort();
    reporter.abort();

    let state = gallery.state();
    println!();
    println!(
        "Loaded {} image(s) in {} page(s){}",
        state.images.len(),
        pages,
        if state.has_next_page {
            "; more available"
        } else {
            ""
        }
    );

    exit
}

/// Download one image through the proxy into `dir`.
async fn save_image(client: &GalleryClient, image: &ImageRecord, dir: &Path) {
    match client.download(image).await {
        Ok(downloaded) => {
            let file_name = downloaded.file_name.replace(['/', '\\'], "_");
            let path = dir.join(file_name);
            match tokio::fs::write(&path, &downloaded.data).await {
                Ok(()) => println!("    saved {} ({} bytes)", path.display(), downloaded.data.len()),
                Err(e) => eprintln!("    failed to write {}: {}", path.display(), e),
            }
        }
        Err(e) => eprintln!("    download failed for {}: {}", image.file_name, e),
    }
}
