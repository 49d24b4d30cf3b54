use crate::config::types::{
    Config, CrawlConfig, SourceEntry, StoreConfig, MAX_DELAY_SECONDS, MAX_REFRESH_INTERVAL_DAYS,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_store_config(&config.store)?;
    validate_crawl_config(&config.crawl)?;
    validate_sources(&config.crawl.sources)?;
    Ok(())
}

fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates crawl policy values
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if !config.delay_seconds.is_finite() || config.delay_seconds < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay_seconds must be a non-negative number, got {}",
            config.delay_seconds
        )));
    }

    if config.delay_seconds > MAX_DELAY_SECONDS {
        return Err(ConfigError::Validation(format!(
            "delay_seconds must be <= {}, got {}",
            MAX_DELAY_SECONDS, config.delay_seconds
        )));
    }

    if config.max_documents < 1 {
        return Err(ConfigError::Validation(
            "max_documents must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    // A zero interval would make every touched document immediately stale again.
    if config.refresh_interval_days < 1 {
        return Err(ConfigError::Validation(
            "refresh_interval_days must be >= 1".to_string(),
        ));
    }

    if config.refresh_interval_days > MAX_REFRESH_INTERVAL_DAYS {
        return Err(ConfigError::Validation(format!(
            "refresh_interval_days must be <= {}, got {}",
            MAX_REFRESH_INTERVAL_DAYS, config.refresh_interval_days
        )));
    }

    if config.snapshot_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "snapshot_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates source entries and their seed URLs
fn validate_sources(sources: &[SourceEntry]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for entry in sources {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source name cannot be empty".to_string(),
            ));
        }

        if !names.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "source '{}' is listed more than once",
                entry.name
            )));
        }

        for seed in &entry.start_urls {
            let url = Url::parse(seed.trim()).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", seed, e))
            })?;

            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::Validation(format!(
                    "Start URL '{}' must use HTTP or HTTPS",
                    seed
                )));
            }
        }
    }

    Ok(())
}
