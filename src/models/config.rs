//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Exchange-rate feed client settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Currency admission and city ranking rules
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Per-shard aggregation settings
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// File layout inside the storage directory
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.feed.base_url)
            .map_err(|e| AppError::validation(format!("feed.base_url is invalid: {e}")))?;
        if !(1..=28).contains(&self.feed.reference_day) {
            return Err(AppError::validation("feed.reference_day must be in 1..=28"));
        }
        if self.feed.user_agent.trim().is_empty() {
            return Err(AppError::validation("feed.user_agent is empty"));
        }
        if self.feed.timeout_secs == 0 {
            return Err(AppError::validation("feed.timeout_secs must be > 0"));
        }
        if self.feed.max_concurrent == 0 {
            return Err(AppError::validation("feed.max_concurrent must be > 0"));
        }
        if self.aggregation.max_concurrent == 0 {
            return Err(AppError::validation("aggregation.max_concurrent must be > 0"));
        }
        if self.analysis.currency_threshold == 0 {
            return Err(AppError::validation("analysis.currency_threshold must be > 0"));
        }
        if self.analysis.city_top_n == 0 {
            return Err(AppError::validation("analysis.city_top_n must be > 0"));
        }
        if self.analysis.share_precision > 15 {
            return Err(AppError::validation("analysis.share_precision must be <= 15"));
        }
        let share = self.analysis.region_min_share;
        if !(share > 0.0 && share <= 1.0) {
            return Err(AppError::validation(
                "analysis.region_min_share must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

/// Exchange-rate feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Daily rates endpoint, queried with `date_req=DD/MM/YYYY`
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Day of month whose quote represents the whole month
    #[serde(default = "defaults::reference_day")]
    pub reference_day: u32,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between completed requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent month requests
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            reference_day: defaults::reference_day(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Filtering and ranking rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum occurrences for a currency to be converted instead of dropped
    #[serde(default = "defaults::currency_threshold")]
    pub currency_threshold: usize,

    /// Number of cities kept in each ranking
    #[serde(default = "defaults::city_top_n")]
    pub city_top_n: usize,

    /// Decimal places of the vacancy share
    #[serde(default = "defaults::share_precision")]
    pub share_precision: u32,

    /// Minimum share of the corpus for a region to get its own shards
    #[serde(default = "defaults::region_min_share")]
    pub region_min_share: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            currency_threshold: defaults::currency_threshold(),
            city_top_n: defaults::city_top_n(),
            share_precision: defaults::share_precision(),
            region_min_share: defaults::region_min_share(),
        }
    }
}

/// Shard aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Maximum shards processed at once
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// File names relative to the storage directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::shards_dir")]
    pub shards_dir: String,

    #[serde(default = "defaults::rates_file")]
    pub rates_file: String,

    #[serde(default = "defaults::normalized_file")]
    pub normalized_file: String,

    #[serde(default = "defaults::manifest_file")]
    pub manifest_file: String,

    #[serde(default = "defaults::statistics_file")]
    pub statistics_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            shards_dir: defaults::shards_dir(),
            rates_file: defaults::rates_file(),
            normalized_file: defaults::normalized_file(),
            manifest_file: defaults::manifest_file(),
            statistics_file: defaults::statistics_file(),
        }
    }
}

mod defaults {
    // Feed defaults
    pub fn base_url() -> String {
        "http://www.cbr.ru/scripts/XML_daily.asp".into()
    }
    pub fn reference_day() -> u32 {
        12
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; vacstat/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        0
    }
    pub fn max_concurrent() -> usize {
        4
    }

    // Analysis defaults
    pub fn currency_threshold() -> usize {
        5000
    }
    pub fn city_top_n() -> usize {
        10
    }
    pub fn share_precision() -> u32 {
        4
    }
    pub fn region_min_share() -> f64 {
        0.01
    }

    // Storage layout defaults
    pub fn shards_dir() -> String {
        "shards".into()
    }
    pub fn rates_file() -> String {
        "currency.csv".into()
    }
    pub fn normalized_file() -> String {
        "normalized.csv".into()
    }
    pub fn manifest_file() -> String {
        "manifest.json".into()
    }
    pub fn statistics_file() -> String {
        "statistics.json".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_reference_day() {
        let mut config = Config::default();
        config.feed.reference_day = 31;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.aggregation.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_region_share() {
        let mut config = Config::default();
        config.analysis.region_min_share = 0.0;
        assert!(config.validate().is_err());
        config.analysis.region_min_share = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_large_share_precision() {
        let mut config = Config::default();
        config.analysis.share_precision = 15;
        assert!(config.validate().is_ok());
        config.analysis.share_precision = 16;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [analysis]
            currency_threshold = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.currency_threshold, 100);
        assert_eq!(config.analysis.city_top_n, 10);
        assert_eq!(config.feed.reference_day, 12);
        assert_eq!(config.paths.shards_dir, "shards");
    }
}
