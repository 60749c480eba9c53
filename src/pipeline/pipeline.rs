// src/pipeline/pipeline.rs

use std::path::Path;

use crate::error::Result;
use crate::models::{Config, StatisticsReport};
use crate::services::{RateFeed, read_vacancies};
use crate::storage::CorpusStorage;

use super::normalize::normalize_records;
use super::rates::build_rates;
use super::statistics::run_statistics;

/// Run rates, normalization and statistics over one vacancy file.
///
/// Region shards are written only when a region is requested.
pub async fn run_pipeline(
    config: &Config,
    storage: &dyn CorpusStorage,
    feed: &dyn RateFeed,
    input: &Path,
    profession: &str,
    region: Option<&str>,
) -> Result<StatisticsReport> {
    log::info!("[1/3] Rates - fetching exchange rates");
    let (records, _) = read_vacancies(input)?;
    let rates = build_rates(config, feed, &records).await;
    storage.save_rate_table(&rates).await?;

    log::info!("[2/3] Normalize - writing year shards");
    normalize_records(config, storage, &records, &rates, region.is_some()).await?;

    log::info!("[3/3] Statistics - aggregating");
    let report = run_statistics(config, storage, profession, region).await?;

    log::info!("Pipeline complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{RateQuote, YearMonth};
    use crate::storage::LocalStorage;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// USD is only published for March 2020.
    struct MarchOnlyFeed;

    #[async_trait]
    impl RateFeed for MarchOnlyFeed {
        async fn monthly_quotes(&self, month: YearMonth) -> Result<Vec<RateQuote>> {
            if month == YearMonth::new(2020, 3).unwrap() {
                Ok(vec![RateQuote {
                    code: "USD".to_string(),
                    value: 60.0,
                    nominal: 1.0,
                }])
            } else {
                Err(AppError::feed(month, "503 Service Unavailable"))
            }
        }
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("vacancies.csv");
        std::fs::write(
            &input,
            "name,key_skills,salary_from,salary_to,salary_currency,area_name,published_at\n\
             Программист,Rust,1000,2000,RUR,Москва,2020-01-15T10:00:00+0300\n\
             Программист,Go,500,,USD,Москва,2020-03-15T10:00:00+0300\n\
             Программист,SQL,,,RUR,Казань,2021-02-15T10:00:00+0300\n\
             Аналитик,Excel,100,,USD,Казань,2021-02-16T10:00:00+0300\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.analysis.currency_threshold = 2;
        let storage = LocalStorage::new(tmp.path());

        let report = run_pipeline(&config, &storage, &MarchOnlyFeed, &input, "Программист", None)
            .await
            .unwrap();

        assert_eq!(report.salary_by_year.get(&2020), Some(&15750));
        assert_eq!(report.count_by_year.get(&2020), Some(&2));
        assert_eq!(report.salary_by_year.get(&2021), Some(&0));
        assert_eq!(report.count_by_year.get(&2021), Some(&0));
        assert_eq!(report.profession_count_by_year.get(&2020), Some(&2));
        assert_eq!(report.city_salary_level.len(), 1);

        let manifest = storage.load_manifest().await.unwrap().unwrap();
        assert_eq!(manifest.stats.without_salary, 2);
        assert!(tmp.path().join("statistics.json").exists());
    }
}
