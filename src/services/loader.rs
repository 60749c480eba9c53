// src/services/loader.rs

//! Corpus loading: currency admission, normalization and year sharding.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::{ExchangeRateTable, NormalizedVacancy, VacancyRecord};
use crate::services::census::CurrencyCensus;
use crate::services::normalizer::SalaryNormalizer;

/// Counters of one corpus load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Records offered to the loader
    pub input: usize,
    /// Dropped because their currency was not admitted
    pub currency_filtered: usize,
    /// Dropped because no salary could be derived
    pub without_salary: usize,
    /// Records kept in the shards
    pub retained: usize,
}

/// Normalized corpus partitioned by publish year.
///
/// Every year observed among admitted records has a shard, even if all of
/// its records were dropped for lack of a salary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedCorpus {
    pub shards: BTreeMap<i32, Vec<NormalizedVacancy>>,
    pub admitted_currencies: Vec<String>,
    pub stats: LoadStats,
}

impl LoadedCorpus {
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.shards.keys().copied()
    }

    /// Total records across all shards.
    pub fn len(&self) -> usize {
        self.shards.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records, in year order.
    pub fn records(&self) -> impl Iterator<Item = &NormalizedVacancy> {
        self.shards.values().flatten()
    }
}

/// Applies currency admission and salary normalization to raw records.
pub struct CorpusLoader<'a> {
    normalizer: SalaryNormalizer<'a>,
    currency_threshold: usize,
}

impl<'a> CorpusLoader<'a> {
    pub fn new(rates: &'a ExchangeRateTable, currency_threshold: usize) -> Self {
        Self {
            normalizer: SalaryNormalizer::new(rates),
            currency_threshold,
        }
    }

    /// Filter, normalize and shard `records` by year.
    pub fn load(&self, records: &[VacancyRecord]) -> LoadedCorpus {
        let admission = CurrencyCensus::from_records(records).admission(self.currency_threshold);

        let mut corpus = LoadedCorpus {
            admitted_currencies: admission.admitted().map(str::to_string).collect(),
            ..LoadedCorpus::default()
        };
        corpus.stats.input = records.len();

        for record in records {
            if !admission.admits(record.salary_currency.as_deref()) {
                corpus.stats.currency_filtered += 1;
                continue;
            }

            let shard = corpus.shards.entry(record.year()).or_default();
            let normalized = self.normalizer.normalize_record(record);
            if normalized.salary.is_some() {
                shard.push(normalized);
                corpus.stats.retained += 1;
            } else {
                corpus.stats.without_salary += 1;
            }
        }

        log::info!(
            "Loaded corpus: {} input, {} currency-filtered, {} without salary, {} retained in {} year shards",
            corpus.stats.input,
            corpus.stats.currency_filtered,
            corpus.stats.without_salary,
            corpus.stats.retained,
            corpus.shards.len()
        );

        corpus
    }
}

/// Year shards of one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionShards {
    pub region: String,
    pub shards: BTreeMap<i32, Vec<NormalizedVacancy>>,
}

/// Partition a loaded corpus by region, then by year.
///
/// Only regions holding at least `min_share` of the corpus are kept. Each
/// kept region gets a shard for every corpus year. Regions are ordered by
/// name.
pub fn partition_by_region(corpus: &LoadedCorpus, min_share: f64) -> Vec<RegionShards> {
    let total = corpus.len();
    if total == 0 {
        return Vec::new();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in corpus.records() {
        *counts.entry(record.area_name.as_str()).or_default() += 1;
    }

    let mut regions: BTreeMap<String, BTreeMap<i32, Vec<NormalizedVacancy>>> = counts
        .into_iter()
        .filter(|(_, count)| *count as f64 / total as f64 >= min_share)
        .map(|(region, _)| {
            let years = corpus.years().map(|year| (year, Vec::new())).collect();
            (region.to_string(), years)
        })
        .collect();

    for (year, records) in &corpus.shards {
        for record in records {
            if let Some(shards) = regions.get_mut(&record.area_name) {
                shards.entry(*year).or_default().push(record.clone());
            }
        }
    }

    regions
        .into_iter()
        .map(|(region, shards)| RegionShards { region, shards })
        .collect()
}
