// src/pipeline/normalize.rs

//! Normalization and sharding step.

use std::path::Path;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{Config, ExchangeRateTable, NormalizedVacancy, VacancyRecord};
use crate::services::{CorpusLoader, LoadedCorpus, partition_by_region, read_vacancies};
use crate::storage::{CorpusManifest, CorpusStorage, ShardEntry, ShardKey};

/// Normalize `records` with `rates` and persist every shard and the manifest.
pub async fn normalize_records(
    config: &Config,
    storage: &dyn CorpusStorage,
    records: &[VacancyRecord],
    rates: &ExchangeRateTable,
    with_regions: bool,
) -> Result<CorpusManifest> {
    let threshold = config.analysis.currency_threshold;
    let corpus = CorpusLoader::new(rates, threshold).load(records);

    let mut shards = Vec::new();
    for (year, vacancies) in &corpus.shards {
        let key = ShardKey::year(*year);
        storage.write_shard(&key, vacancies).await?;
        shards.push(ShardEntry {
            key,
            records: vacancies.len(),
        });
    }

    if with_regions {
        let regions = partition_by_region(&corpus, config.analysis.region_min_share);
        log::info!(
            "{} regions hold at least {}% of the corpus",
            regions.len(),
            config.analysis.region_min_share * 100.0
        );
        for region in regions {
            for (year, vacancies) in &region.shards {
                let key = ShardKey::region(*year, region.region.as_str());
                storage.write_shard(&key, vacancies).await?;
                shards.push(ShardEntry {
                    key,
                    records: vacancies.len(),
                });
            }
        }
    }

    storage.save_normalized(&flatten(&corpus)).await?;

    let manifest = CorpusManifest {
        updated_at: Utc::now(),
        currency_threshold: threshold,
        admitted_currencies: corpus.admitted_currencies,
        stats: corpus.stats,
        shards,
    };
    storage.save_manifest(&manifest).await?;

    log::info!(
        "Wrote {} shards, {} normalized vacancies",
        manifest.shards.len(),
        manifest.stats.retained
    );
    Ok(manifest)
}

fn flatten(corpus: &LoadedCorpus) -> Vec<NormalizedVacancy> {
    corpus.records().cloned().collect()
}

/// Read the vacancy file and normalize it with the saved rate table.
pub async fn run_normalize(
    config: &Config,
    storage: &dyn CorpusStorage,
    input: &Path,
    with_regions: bool,
) -> Result<CorpusManifest> {
    log::info!("Normalizing {:?}", input);

    let rates = storage
        .load_rate_table()
        .await?
        .ok_or_else(|| AppError::validation("no rate table found; run `rates` first"))?;
    let (records, _) = read_vacancies(input)?;

    normalize_records(config, storage, &records, &rates, with_regions).await
}
