//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── currency.csv          # Rate table
//! ├── normalized.csv        # Salary-bearing normalized corpus
//! ├── manifest.json         # Shard listing
//! ├── statistics.json       # Latest StatisticsReport
//! └── shards/
//!     ├── part_YYYY.csv
//!     └── regions/<slug>/part_YYYY.csv
//! ```
//!
//! File names come from [`PathsConfig`]. All writes go to a temporary file
//! first and are renamed into place.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{ExchangeRateTable, NormalizedVacancy, PathsConfig, StatisticsReport};
use crate::storage::{CorpusManifest, CorpusStorage, ShardKey};
use crate::utils::region_slug;

/// Column order of shard and normalized corpus files.
const SHARD_HEADER: [&str; 4] = ["name", "area_name", "published_at", "salary"];

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    paths: PathsConfig,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self::with_paths(root_dir, PathsConfig::default())
    }

    /// Create a LocalStorage with custom file names.
    pub fn with_paths(root_dir: impl Into<PathBuf>, paths: PathsConfig) -> Self {
        Self {
            root_dir: root_dir.into(),
            paths,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Relative key of a shard file.
    fn shard_key(&self, key: &ShardKey) -> String {
        match &key.region {
            Some(region) => format!(
                "{}/regions/{}/part_{}.csv",
                self.paths.shards_dir,
                region_slug(region),
                key.year
            ),
            None => format!("{}/part_{}.csv", self.paths.shards_dir, key.year),
        }
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Write vacancy rows as CSV; the header is written even with no rows.
    async fn write_rows(&self, key: &str, records: &[NormalizedVacancy]) -> Result<()> {
        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        csv.write_record(SHARD_HEADER)?;
        for record in records {
            csv.serialize(record)?;
        }
        let bytes = csv
            .into_inner()
            .map_err(|e| AppError::Io(e.into_error()))?;
        self.write_bytes(key, &bytes).await
    }

    /// Read vacancy rows written by [`LocalStorage::write_rows`].
    async fn read_rows(&self, key: &str) -> Result<Option<Vec<NormalizedVacancy>>> {
        let Some(bytes) = self.read_bytes(key).await? else {
            return Ok(None);
        };
        let mut csv = csv::Reader::from_reader(bytes.as_slice());
        let records = csv
            .deserialize()
            .collect::<std::result::Result<Vec<NormalizedVacancy>, _>>()?;
        Ok(Some(records))
    }
}

#[async_trait]
impl CorpusStorage for LocalStorage {
    async fn write_shard(&self, key: &ShardKey, records: &[NormalizedVacancy]) -> Result<()> {
        let path = self.shard_key(key);
        self.write_rows(&path, records).await?;
        log::debug!("Shard {}: {} records written to {}", key, records.len(), path);
        Ok(())
    }

    async fn read_shard(&self, key: &ShardKey) -> Result<Option<Vec<NormalizedVacancy>>> {
        self.read_rows(&self.shard_key(key)).await
    }

    async fn save_manifest(&self, manifest: &CorpusManifest) -> Result<()> {
        self.write_json(&self.paths.manifest_file, manifest).await
    }

    async fn load_manifest(&self) -> Result<Option<CorpusManifest>> {
        self.read_json(&self.paths.manifest_file).await
    }

    async fn save_rate_table(&self, table: &ExchangeRateTable) -> Result<()> {
        let mut bytes = Vec::new();
        table.write_csv(&mut bytes)?;
        self.write_bytes(&self.paths.rates_file, &bytes).await
    }

    async fn load_rate_table(&self) -> Result<Option<ExchangeRateTable>> {
        match self.read_bytes(&self.paths.rates_file).await? {
            Some(bytes) => Ok(Some(ExchangeRateTable::read_csv(bytes.as_slice())?)),
            None => Ok(None),
        }
    }

    async fn save_normalized(&self, records: &[NormalizedVacancy]) -> Result<()> {
        self.write_rows(&self.paths.normalized_file, records).await
    }

    async fn load_normalized(&self) -> Result<Option<Vec<NormalizedVacancy>>> {
        self.read_rows(&self.paths.normalized_file).await
    }

    async fn save_report(&self, report: &StatisticsReport) -> Result<()> {
        self.write_json(&self.paths.statistics_file, report).await
    }

    async fn load_report(&self) -> Result<Option<StatisticsReport>> {
        self.read_json(&self.paths.statistics_file).await
    }
}
