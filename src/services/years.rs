// src/services/years.rs

//! Per-year salary statistics over year shards.
//!
//! Each shard is summarized on its own task; summaries are merged by year
//! key, so completion order never affects the result.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::models::{AggregationConfig, NormalizedVacancy, YearStat, YearStatistic};
use crate::storage::{CorpusStorage, ShardKey};

/// Statistics of one year shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardSummary {
    pub year: i32,
    /// All salary-bearing records of the shard
    pub overall: YearStat,
    /// Records whose name contains the profession
    pub filtered: YearStat,
}

/// Summarize one shard for `profession` (case-sensitive substring).
pub fn summarize_shard(year: i32, records: &[NormalizedVacancy], profession: &str) -> ShardSummary {
    let salaries = || records.iter().filter_map(|r| r.salary.map(|s| (r, s)));
    ShardSummary {
        year,
        overall: YearStat::from_salaries(salaries().map(|(_, s)| s)),
        filtered: YearStat::from_salaries(
            salaries()
                .filter(|(r, _)| r.matches_profession(profession))
                .map(|(_, s)| s),
        ),
    }
}

/// Merge shard summaries into the (overall, filtered) statistics pair.
///
/// Shard years are unique, so the result does not depend on input order.
pub fn merge_summaries(
    summaries: impl IntoIterator<Item = ShardSummary>,
) -> (YearStatistic, YearStatistic) {
    let mut overall = YearStatistic::new();
    let mut filtered = YearStatistic::new();
    for summary in summaries {
        overall.insert(summary.year, summary.overall);
        filtered.insert(summary.year, summary.filtered);
    }
    (overall, filtered)
}

/// Aggregate shards already held in memory.
pub fn aggregate_shards(
    shards: &BTreeMap<i32, Vec<NormalizedVacancy>>,
    profession: &str,
) -> (YearStatistic, YearStatistic) {
    merge_summaries(
        shards
            .iter()
            .map(|(year, records)| summarize_shard(*year, records, profession)),
    )
}

/// Reads year shards from storage and summarizes them concurrently.
#[derive(Debug, Clone, Copy)]
pub struct YearAggregator {
    concurrency: usize,
}

impl Default for YearAggregator {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

impl YearAggregator {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(config: &AggregationConfig) -> Self {
        Self::new(config.max_concurrent)
    }

    /// Aggregate the shards named by `keys`.
    ///
    /// A shard that is missing or unreadable contributes nothing; the
    /// remaining years are still returned.
    pub async fn aggregate(
        &self,
        storage: &dyn CorpusStorage,
        keys: &[ShardKey],
        profession: &str,
    ) -> (YearStatistic, YearStatistic) {
        let profession: Arc<str> = Arc::from(profession);

        let summaries: Vec<Option<ShardSummary>> = stream::iter(keys.iter().cloned())
            .map(|key| {
                let profession = Arc::clone(&profession);
                async move { summarize_stored(storage, key, profession).await }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let skipped = summaries.iter().filter(|s| s.is_none()).count();
        let (overall, filtered) = merge_summaries(summaries.into_iter().flatten());

        log::info!(
            "Aggregated {} year shards ({} skipped)",
            overall.len(),
            skipped
        );
        (overall, filtered)
    }
}

async fn summarize_stored(
    storage: &dyn CorpusStorage,
    key: ShardKey,
    profession: Arc<str>,
) -> Option<ShardSummary> {
    let records = match storage.read_shard(&key).await {
        Ok(Some(records)) => records,
        Ok(None) => {
            log::warn!("Shard {} is missing; skipping year", key);
            return None;
        }
        Err(e) => {
            log::warn!("Shard {} is unreadable: {}; skipping year", key, e);
            return None;
        }
    };

    let year = key.year;
    match tokio::task::spawn_blocking(move || summarize_shard(year, &records, &profession)).await {
        Ok(summary) => Some(summary),
        Err(e) => {
            log::warn!("Shard {} task failed: {}", key, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExchangeRateTable, VacancyRecord, YearMonth, parse_published_at};
    use crate::services::CorpusLoader;
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    fn vacancy(name: &str, at: &str, salary: f64) -> NormalizedVacancy {
        NormalizedVacancy {
            name: name.to_string(),
            area_name: "Москва".to_string(),
            published_at: parse_published_at(at).unwrap(),
            salary: Some(salary),
        }
    }

    fn stat(mean_salary: i64, count: usize) -> YearStat {
        YearStat { mean_salary, count }
    }

    #[test]
    fn test_three_record_corpus() {
        let raw = |from, to, currency: &str, at: &str| VacancyRecord {
            name: "Программист".to_string(),
            salary_from: from,
            salary_to: to,
            salary_currency: Some(currency.to_string()),
            area_name: "Москва".to_string(),
            published_at: parse_published_at(at).unwrap(),
        };
        let records = vec![
            raw(Some(1000.0), Some(2000.0), "RUR", "2020-02-01T00:00:00+0300"),
            raw(Some(500.0), None, "USD", "2020-07-01T00:00:00+0300"),
            raw(None, None, "RUR", "2021-03-01T00:00:00+0300"),
        ];
        let mut rates = ExchangeRateTable::with_currencies(["USD"]);
        rates.insert(YearMonth::new(2020, 7).unwrap(), "USD", 60.0);

        let corpus = CorpusLoader::new(&rates, 1).load(&records);
        let (overall, filtered) = aggregate_shards(&corpus.shards, "Программист");

        assert_eq!(overall.get(2020), Some(&stat(15750, 2)));
        assert_eq!(overall.get(2021), Some(&stat(0, 0)));
        assert_eq!(filtered, overall);
    }

    #[test]
    fn test_unmatched_profession_yields_zero_entries() {
        let shards = BTreeMap::from([
            (2019, vec![vacancy("Аналитик", "2019-05-05T00:00:00+0300", 100.0)]),
            (2020, vec![vacancy("Тестировщик", "2020-05-05T00:00:00+0300", 300.0)]),
        ]);
        let (overall, filtered) = aggregate_shards(&shards, "аналитик");

        assert_eq!(overall.len(), 2);
        assert_eq!(filtered.get(2019), Some(&stat(0, 0)));
        assert_eq!(filtered.get(2020), Some(&stat(0, 0)));
    }

    #[test]
    fn test_merge_is_order_independent() {
        let summaries = vec![
            summarize_shard(2022, &[vacancy("Dev", "2022-01-01T00:00:00+0300", 10.0)], "Dev"),
            summarize_shard(2020, &[vacancy("QA", "2020-01-01T00:00:00+0300", 20.0)], "Dev"),
            summarize_shard(2021, &[], "Dev"),
        ];
        let forward = merge_summaries(summaries.iter().copied());
        let backward = merge_summaries(summaries.iter().rev().copied());

        assert_eq!(forward, backward);
        assert_eq!(forward.0.years().collect::<Vec<_>>(), vec![2020, 2021, 2022]);
    }

    #[tokio::test]
    async fn test_missing_shard_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage
            .write_shard(
                &ShardKey::year(2020),
                &[
                    vacancy("Senior Dev", "2020-01-01T00:00:00+0300", 100.0),
                    vacancy("QA", "2020-06-01T00:00:00+0300", 201.0),
                ],
            )
            .await
            .unwrap();
        storage.write_shard(&ShardKey::year(2021), &[]).await.unwrap();

        let keys = vec![ShardKey::year(2021), ShardKey::year(1999), ShardKey::year(2020)];
        let (overall, filtered) = YearAggregator::new(2).aggregate(&storage, &keys, "Dev").await;

        assert_eq!(overall.years().collect::<Vec<_>>(), vec![2020, 2021]);
        assert_eq!(overall.get(2020), Some(&stat(150, 2)));
        assert_eq!(filtered.get(2020), Some(&stat(100, 1)));
        assert_eq!(filtered.get(2021), Some(&stat(0, 0)));
    }
}
