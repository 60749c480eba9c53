// src/pipeline/validate.rs

use std::path::Path;

use crate::config::{config_path, load_config};
use crate::error::Result;
use crate::models::Config;

/// Validate the configuration of a storage directory and log its settings.
pub fn run_validate(storage_dir: &Path) -> Result<Config> {
    log::info!("Validating {:?}", config_path(storage_dir));

    match load_config(storage_dir) {
        Ok(config) => {
            log::info!("Configuration is valid");
            log::info!("  feed: {} (day {})", config.feed.base_url, config.feed.reference_day);
            log::info!(
                "  currency threshold: {}, top cities: {}, region share: {}",
                config.analysis.currency_threshold,
                config.analysis.city_top_n,
                config.analysis.region_min_share
            );
            log::info!(
                "  concurrency: feed {}, shards {}",
                config.feed.max_concurrent,
                config.aggregation.max_concurrent
            );
            Ok(config)
        }
        Err(e) => {
            log::error!("Configuration is invalid: {}", e);
            Err(e)
        }
    }
}
