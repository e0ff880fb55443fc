pub mod catalog;
pub mod config;
pub mod correlator;
pub mod launcher;
pub mod progress;
pub mod selection;
pub mod testing;

pub use catalog::{
    CatalogError, ListingSource, MediaRecord, SearchQuery, SeedFragment, TorrentCandidate,
    TorrentListing, YtsListingSource,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, CatalogConfig,
    Config, ConfigError, DownloaderConfig, SelectionConfig,
};
pub use correlator::{correlate, read_fragment, FragmentReading, TorrentRecord};
pub use launcher::{DownloadLauncher, DownloadOutcome, LaunchError, RunningDownload};
pub use progress::{
    monitor_output, parse_size, DownloadProgress, DownloadSession, ProgressMonitor,
    SizeParseError,
};
pub use selection::{select, SelectionError};
