//! Service layer for the statistics pipeline.
//!
//! This module contains the business logic for:
//! - Vacancy CSV ingestion (`read_vacancies`)
//! - Currency admission (`CurrencyCensus`)
//! - Exchange-rate retrieval (`RateFeed`, `CbrRateFeed`, `build_rate_table`)
//! - Salary normalization (`SalaryNormalizer`)
//! - Year sharding (`CorpusLoader`)
//! - Year and city aggregation (`YearAggregator`, `CityAggregator`)

mod census;
mod cities;
mod loader;
mod normalizer;
mod rates;
mod reader;
mod years;

pub use census::{CurrencyAdmission, CurrencyCensus};
pub use cities::CityAggregator;
pub use loader::{CorpusLoader, LoadStats, LoadedCorpus, RegionShards, partition_by_region};
pub use normalizer::SalaryNormalizer;
pub use rates::{
    CbrRateFeed, RateBuildOptions, RateFeed, build_rate_table, corpus_months, parse_daily_rates,
};
pub use reader::{IngestReport, read_vacancies, read_vacancies_from};
pub use years::{
    ShardSummary, YearAggregator, aggregate_shards, merge_summaries, summarize_shard,
};
