//! Storage abstractions for the normalized corpus and its derivatives.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml
//! ├── currency.csv          # Monthly exchange rates
//! ├── normalized.csv        # Full normalized corpus
//! ├── manifest.json         # Shard listing and load counters
//! ├── statistics.json       # Latest report
//! └── shards/
//!     ├── part_2020.csv     # Year shards
//!     └── regions/
//!         └── <slug>/
//!             └── part_2020.csv
//! ```

pub mod local;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{ExchangeRateTable, NormalizedVacancy, StatisticsReport};
use crate::services::LoadStats;

pub use local::LocalStorage;

/// Identifies one shard: a year, optionally narrowed to a region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShardKey {
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl ShardKey {
    pub fn year(year: i32) -> Self {
        Self { year, region: None }
    }

    pub fn region(year: i32, region: impl Into<String>) -> Self {
        Self {
            year,
            region: Some(region.into()),
        }
    }
}

impl std::fmt::Display for ShardKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{} ({})", self.year, region),
            None => write!(f, "{}", self.year),
        }
    }
}

/// A shard listed in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardEntry {
    #[serde(flatten)]
    pub key: ShardKey,
    /// Records written to the shard
    pub records: usize,
}

/// Summary of the last normalization run, stored as `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusManifest {
    pub updated_at: DateTime<Utc>,
    pub currency_threshold: usize,
    pub admitted_currencies: Vec<String>,
    pub stats: LoadStats,
    pub shards: Vec<ShardEntry>,
}

impl CorpusManifest {
    /// Year shards, ascending.
    pub fn year_keys(&self) -> Vec<ShardKey> {
        self.keys_where(|key| key.region.is_none())
    }

    /// Shards of one region, ascending by year.
    pub fn region_keys(&self, region: &str) -> Vec<ShardKey> {
        self.keys_where(|key| key.region.as_deref() == Some(region))
    }

    /// Regions that have shards, by name.
    pub fn regions(&self) -> Vec<&str> {
        self.shards
            .iter()
            .filter_map(|entry| entry.key.region.as_deref())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn keys_where(&self, keep: impl Fn(&ShardKey) -> bool) -> Vec<ShardKey> {
        let mut keys: Vec<ShardKey> = self
            .shards
            .iter()
            .map(|entry| &entry.key)
            .filter(|key| keep(key))
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

/// Trait for corpus storage backends.
///
/// Every `load_*`/`read_*` method returns `Ok(None)` when the object has
/// never been written.
#[async_trait]
pub trait CorpusStorage: Send + Sync {
    /// Replace one shard.
    async fn write_shard(&self, key: &ShardKey, records: &[NormalizedVacancy]) -> Result<()>;

    async fn read_shard(&self, key: &ShardKey) -> Result<Option<Vec<NormalizedVacancy>>>;

    async fn save_manifest(&self, manifest: &CorpusManifest) -> Result<()>;

    async fn load_manifest(&self) -> Result<Option<CorpusManifest>>;

    async fn save_rate_table(&self, table: &ExchangeRateTable) -> Result<()>;

    async fn load_rate_table(&self) -> Result<Option<ExchangeRateTable>>;

    /// Replace the full normalized corpus.
    async fn save_normalized(&self, records: &[NormalizedVacancy]) -> Result<()>;

    async fn load_normalized(&self) -> Result<Option<Vec<NormalizedVacancy>>>;

    async fn save_report(&self, report: &StatisticsReport) -> Result<()>;

    async fn load_report(&self) -> Result<Option<StatisticsReport>>;
}
