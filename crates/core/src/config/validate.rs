use super::{types::Config, ConfigError};

/// Highest minimum-rating filter the catalog accepts
const MAX_RATING: u8 = 9;

/// Validate configuration
/// Currently validates:
/// - Catalog base URL is http(s) and the request timeout is not 0
/// - Query rating is within the catalog's 0-9 range
/// - Downloader program and scratch file are set, scratch file is a bare name
/// - Optional tool deadline is not 0, progress buffer is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.catalog.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "catalog.base_url must be an http(s) URL, got {:?}",
            config.catalog.base_url
        )));
    }

    if config.catalog.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.query.rating > MAX_RATING {
        return Err(ConfigError::ValidationError(format!(
            "query.rating must be between 0 and {}, got {}",
            MAX_RATING, config.query.rating
        )));
    }

    let downloader = &config.downloader;
    if downloader.program.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "downloader.program cannot be empty".to_string(),
        ));
    }

    if downloader.scratch_file.is_empty()
        || downloader.scratch_file.contains('/')
        || downloader.scratch_file.contains('\\')
    {
        return Err(ConfigError::ValidationError(format!(
            "downloader.scratch_file must be a plain file name, got {:?}",
            downloader.scratch_file
        )));
    }

    if downloader.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "downloader.timeout_secs cannot be 0".to_string(),
        ));
    }

    if downloader.progress_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "downloader.progress_buffer cannot be 0".to_string(),
        ));
    }

    Ok(())
}
