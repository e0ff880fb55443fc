//! Download lifecycle integration tests.
//!
//! These tests run the whole flow against a local HTTP server standing in
//! for the catalog and a shell script standing in for the download tool:
//! - Movie listing and torrent listing scraping
//! - Seed count correlation
//! - Payload fetch into the scratch directory
//! - Progress parsing from the tool's table output
//! - Tool failure and timeout handling

#![cfg(unix)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reelgrab_core::{
    correlate, select, CatalogConfig, DownloadLauncher, DownloaderConfig, LaunchError,
    ListingSource, SearchQuery, YtsListingSource,
};

const BROWSE_PAGE: &str = r#"
<html><body>
  <div class="browse-movie-wrap col-xs-10">
    <a href="/movies/seven-samurai-1954" class="browse-movie-link">
      <img class="img-responsive" src="/assets/seven-samurai.jpg" alt="">
    </a>
    <a href="/movies/seven-samurai-1954" class="browse-movie-title">Seven Samurai</a>
    <div class="browse-movie-year">1954</div>
  </div>
  <div class="browse-movie-wrap col-xs-10">
    <a href="/movies/ikiru-1952" class="browse-movie-link">
      <img class="img-responsive" src="/assets/ikiru.jpg" alt="">
    </a>
    <a href="/movies/ikiru-1952" class="browse-movie-title">Ikiru</a>
    <div class="browse-movie-year">1952</div>
  </div>
</body></html>
"#;

const DETAIL_PAGE: &str = r#"
<html><body>
  <p class="hidden-xs hidden-sm">Available in:
    <a href="/torrent/download/AAA" rel="nofollow" title="Ikiru 720p">720p.BluRay</a>
    <a href="/torrent/download/BBB" rel="nofollow" title="Ikiru 1080p">1080p.BluRay</a>
  </p>
  <div class="tech-spec-info">
    <div class="tech-spec-element">1.02 GB</div>
    <div class="tech-spec-element">Seeds 31</div>
    <div class="tech-spec-element">2.15 GB</div>
    <div class="tech-spec-element">Seeds 17</div>
  </div>
</body></html>
"#;

/// Tool output: two size estimates, then two refresh blocks.
const TOOL_OUTPUT: &str = "Fetching metadata...
Size | \x1b[32m3 MB\x1b[39m
Size | \x1b[32m4 MB\x1b[39m
┌────────────────────┬────────────┐
├────────────────────┼────────────┤
│ '10.0.0.1:6881' │ '1 MB' │
│ '10.0.0.2:6881' │ '0 Bytes' │ '0 Bytes/s' │
└────────────────────┴────────────┘
├────────────────────┼────────────┤
│ '10.0.0.1:6881' │ '1 MB' │
│ '10.0.0.2:6881' │ '1 MB' │
└────────────────────┴────────────┘
├────────────────────┼────────────┤
│ '10.0.0.1:6881' │ '2 MB' │
";

/// Test helper wiring a mock catalog to a scripted download tool.
struct TestHarness {
    server: MockServer,
    work_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/browse-movies/0/all/all/9/latest/0/all"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BROWSE_PAGE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/movies/ikiru-1952"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_PAGE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/torrent/download/BBB"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"d8:announce3:url4:infod4:name5:ikiruee".to_vec()),
            )
            .mount(&server)
            .await;

        let work_dir = TempDir::new().expect("Failed to create temp dir");

        Self { server, work_dir }
    }

    fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            base_url: self.server.uri(),
            ..CatalogConfig::default()
        }
    }

    /// Writes `body` as a shell script and returns a downloader config that
    /// runs it. The script receives the scratch file name as `$1`.
    fn downloader_config(&self, body: &str) -> DownloaderConfig {
        let script = self.work_dir.path().join("fake-tool.sh");
        std::fs::write(&script, body).expect("Failed to write tool script");

        DownloaderConfig {
            program: PathBuf::from("sh"),
            args: vec![script.display().to_string()],
            scratch_dir: self.work_dir.path().join("movies"),
            ..DownloaderConfig::default()
        }
    }

    /// A tool that checks the payload is in place, prints `TOOL_OUTPUT` and
    /// exits with `code`.
    fn scripted_tool(&self, code: i32) -> DownloaderConfig {
        self.downloader_config(&format!(
            "[ -s \"$1\" ] || exit 3\ncat <<'OUT'\n{}OUT\nexit {}\n",
            TOOL_OUTPUT, code
        ))
    }
}

#[tokio::test]
async fn test_full_download_flow() {
    let harness = TestHarness::new().await;
    let source = YtsListingSource::new(&harness.catalog_config()).unwrap();

    let query = SearchQuery {
        rating: 9,
        ..Default::default()
    };
    let movies = source.find_movies(&query).await.unwrap();
    assert!(movies.len() >= 2);

    let movie = select(&movies, 1, "movie").unwrap();
    assert_eq!(movie.title, "Ikiru");
    assert_eq!(movie.year, "1952");
    assert_eq!(movie.page_url, format!("{}/movies/ikiru-1952", harness.server.uri()));

    let listing = source.torrent_listing(movie).await.unwrap();
    assert!(listing.candidates.len() >= 2);

    let records = correlate(listing.candidates, &listing.seed_fragments);
    assert!(records.len() >= 2);
    assert_eq!(records[0].seeds, Some(31));
    assert_eq!(records[1].seeds, Some(17));

    let record = select(&records, 1, "torrent").unwrap();
    assert_eq!(record.quality, "1080p.BluRay");

    let config = harness.scripted_tool(0);
    let scratch = config.scratch_path();
    let launcher = DownloadLauncher::new(config, &harness.catalog_config()).unwrap();

    let (tx, mut rx) = mpsc::channel(16);
    let outcome = launcher.download(record, Some(tx)).await.unwrap();

    assert!(outcome.status.success());
    assert!(scratch.exists());

    let progress = outcome.progress();
    assert_eq!(progress.expected_kb, 4096);
    assert_eq!(progress.downloaded_kb, 2048);
    assert!((0.0..=100.0).contains(&progress.percent));
    assert!((progress.percent - 50.0).abs() < 1e-9);
    assert_eq!(outcome.session.cycles(), 2);
    // The third block never closed.
    assert_eq!(outcome.session.in_flight_kb(), 2048);

    let mut percents = Vec::new();
    while let Some(update) = rx.recv().await {
        percents.push(update.percent);
    }
    assert_eq!(percents, vec![0.0, 25.0, 25.0, 50.0]);
}

#[tokio::test]
async fn test_tool_failure_keeps_progress() {
    let harness = TestHarness::new().await;
    let launcher =
        DownloadLauncher::new(harness.scripted_tool(2), &harness.catalog_config()).unwrap();

    let record = reelgrab_core::TorrentRecord {
        link: format!("{}/torrent/download/BBB", harness.server.uri()),
        quality: "1080p.BluRay".to_string(),
        seeds: Some(17),
    };

    match launcher.download(&record, None).await {
        Err(LaunchError::ToolFailed { code, progress }) => {
            assert_eq!(code, Some(2));
            assert_eq!(progress.downloaded_kb, 2048);
            assert!((progress.percent - 50.0).abs() < 1e-9);
        }
        other => panic!("expected ToolFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_tool_timeout_kills_process() {
    let harness = TestHarness::new().await;
    let config = DownloaderConfig {
        timeout_secs: Some(1),
        ..harness.downloader_config("echo 'Size | 1 GB'\nexec sleep 30\n")
    };
    let launcher = DownloadLauncher::new(config, &harness.catalog_config()).unwrap();

    let record = reelgrab_core::TorrentRecord {
        link: format!("{}/torrent/download/BBB", harness.server.uri()),
        quality: "1080p.BluRay".to_string(),
        seeds: Some(17),
    };

    let err = launcher.download(&record, None).await.unwrap_err();
    assert!(matches!(err, LaunchError::Timeout { timeout_secs: 1 }));
}

#[tokio::test]
async fn test_tool_timeout_kills_child_processes() {
    let harness = TestHarness::new().await;
    // The shell stays alive and its `sleep` child inherits the output pipe.
    let config = DownloaderConfig {
        timeout_secs: Some(1),
        ..harness.downloader_config("echo 'Size | 1 GB'\nsleep 30\necho done\n")
    };
    let launcher = DownloadLauncher::new(config, &harness.catalog_config()).unwrap();

    let record = reelgrab_core::TorrentRecord {
        link: format!("{}/torrent/download/BBB", harness.server.uri()),
        quality: "1080p.BluRay".to_string(),
        seeds: Some(17),
    };

    let started = Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(8), launcher.download(&record, None))
        .await
        .expect("download did not return after the tool deadline");

    assert!(matches!(result, Err(LaunchError::Timeout { timeout_secs: 1 })));
    assert!(started.elapsed() < Duration::from_secs(8));
}

#[tokio::test]
async fn test_leftover_background_process_does_not_block() {
    let harness = TestHarness::new().await;
    // The tool exits but leaves a background process holding its stdout.
    let config = harness.downloader_config("sleep 30 &\necho 'Size | 1 GB'\nexit 0\n");
    let launcher = DownloadLauncher::new(config, &harness.catalog_config()).unwrap();

    let record = reelgrab_core::TorrentRecord {
        link: format!("{}/torrent/download/BBB", harness.server.uri()),
        quality: "1080p.BluRay".to_string(),
        seeds: Some(17),
    };

    let outcome = tokio::time::timeout(Duration::from_secs(15), launcher.download(&record, None))
        .await
        .expect("download blocked on leftover process")
        .unwrap();

    assert!(outcome.status.success());
    assert_eq!(outcome.session.expected_kb(), 1_048_576);
}

#[tokio::test]
async fn test_missing_payload_stops_before_tool() {
    let harness = TestHarness::new().await;
    let config = harness.scripted_tool(0);
    let scratch = config.scratch_path();
    let launcher = DownloadLauncher::new(config, &harness.catalog_config()).unwrap();

    let record = reelgrab_core::TorrentRecord {
        link: format!("{}/torrent/download/ZZZ", harness.server.uri()),
        quality: "720p".to_string(),
        seeds: None,
    };

    let err = launcher.download(&record, None).await.unwrap_err();
    assert!(matches!(err, LaunchError::PayloadStatus { status: 404, .. }));
    assert!(!scratch.exists());
}
