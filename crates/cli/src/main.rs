use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelgrab_core::{
    correlate, load_config, load_config_from_env, select, validate_config, Config,
    DownloadLauncher, DownloadProgress, ListingSource, YtsListingSource,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("reelgrab v{}", VERSION);

    let config = read_config()?;
    validate_config(&config).context("Configuration validation failed")?;

    let source = YtsListingSource::new(&config.catalog).context("Failed to create catalog client")?;
    info!("Using catalog: {}", source.name());

    // Find movies and pick one
    let movies = source
        .find_movies(&config.query)
        .await
        .context("Failed to list movies")?;
    info!("Found {} movies", movies.len());

    let movie = select(&movies, config.selection.movie_index, "movie")?;
    info!(
        title = %movie.title,
        year = %movie.year,
        cover = %movie.cover_url,
        page = %movie.page_url,
        "Selected movie"
    );

    // Pair torrents with seed counts
    let listing = source
        .torrent_listing(movie)
        .await
        .with_context(|| format!("Failed to fetch torrents for {:?}", movie.title))?;
    let records = correlate(listing.candidates, &listing.seed_fragments);

    for record in &records {
        info!(
            quality = %record.quality,
            seeds = ?record.seeds,
            link = %record.link,
            "Torrent"
        );
    }

    let record = select(&records, config.selection.torrent_index, "torrent")?;
    info!(quality = %record.quality, seeds = ?record.seeds, "Selected torrent");

    // Download, reporting progress as it arrives
    let launcher = DownloadLauncher::new(config.downloader.clone(), &config.catalog)
        .context("Failed to create downloader")?;

    let (progress_tx, progress_rx) = mpsc::channel(config.downloader.progress_buffer);
    let reporter = tokio::spawn(report_progress(progress_rx));

    let result = launcher.download(record, Some(progress_tx)).await;
    if let Err(e) = reporter.await {
        warn!("Progress reporter stopped: {}", e);
    }

    let outcome = result.context("Download failed")?;
    let progress = outcome.progress();
    info!(
        percent = progress.percent,
        expected_kb = progress.expected_kb,
        downloaded_kb = progress.downloaded_kb,
        status = %outcome.status,
        "Download finished"
    );

    Ok(())
}

/// Loads the config file named by `REELGRAB_CONFIG` (default `reelgrab.toml`),
/// falling back to built-in defaults when no file exists.
fn read_config() -> Result<Config> {
    let config_path = std::env::var("REELGRAB_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("reelgrab.toml"));

    if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))
    } else {
        info!("No config file at {:?}, using defaults", config_path);
        load_config_from_env().context("Failed to load config from environment")
    }
}

/// Logs progress updates until the sender side is dropped.
async fn report_progress(mut rx: mpsc::Receiver<DownloadProgress>) {
    while let Some(progress) = rx.recv().await {
        info!(
            downloaded_kb = progress.downloaded_kb,
            expected_kb = progress.expected_kb,
            "Progress: {:.1}%",
            progress.percent
        );
    }
}
