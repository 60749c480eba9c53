// src/pipeline/statistics.rs

//! Statistics step: year and city aggregation into a report.

use crate::error::{AppError, Result};
use crate::models::{Config, StatisticsReport};
use crate::services::{CityAggregator, YearAggregator};
use crate::storage::CorpusStorage;

/// Aggregate the stored corpus for `profession`, optionally within one region.
///
/// Year statistics come from the shards listed in the manifest; city
/// statistics always cover the full normalized corpus.
pub async fn run_statistics(
    config: &Config,
    storage: &dyn CorpusStorage,
    profession: &str,
    region: Option<&str>,
) -> Result<StatisticsReport> {
    if profession.trim().is_empty() {
        return Err(AppError::validation("profession name must not be empty"));
    }

    let manifest = storage
        .load_manifest()
        .await?
        .ok_or_else(|| AppError::validation("no manifest found; run `normalize` first"))?;

    let keys = match region {
        Some(region) => {
            let keys = manifest.region_keys(region);
            if keys.is_empty() {
                return Err(AppError::validation(format!(
                    "region '{region}' has no shards; known regions: {:?}",
                    manifest.regions()
                )));
            }
            keys
        }
        None => manifest.year_keys(),
    };

    log::info!(
        "Aggregating {} shards for '{}'{}",
        keys.len(),
        profession,
        region.map(|r| format!(" in {r}")).unwrap_or_default()
    );

    let (overall, filtered) = YearAggregator::from_config(&config.aggregation)
        .aggregate(storage, &keys, profession)
        .await;

    let normalized = match storage.load_normalized().await? {
        Some(records) => records,
        None => {
            log::warn!("Normalized corpus is missing; city statistics will be empty");
            Vec::new()
        }
    };
    let cities = CityAggregator::from_config(&config.analysis).aggregate(&normalized);

    let report = StatisticsReport::new(
        profession,
        region.map(str::to_string),
        &overall,
        &filtered,
        cities,
    );
    storage.save_report(&report).await?;

    for line in report.lines() {
        log::info!("{}", line);
    }
    Ok(report)
}
