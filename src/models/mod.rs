// src/models/mod.rs

//! Domain models for the statistics pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod month;
mod rates;
mod statistics;
mod vacancy;

// Re-export all public types
pub use config::{AggregationConfig, AnalysisConfig, Config, FeedConfig, PathsConfig};
pub use month::{YearMonth, month_range};
pub use rates::{ExchangeRateTable, RateQuote};
pub use statistics::{
    CityRank, CityStatistic, StatisticsReport, YearStat, YearStatistic, floor_mean,
};
pub use vacancy::{
    BASE_CURRENCY, NormalizedVacancy, PUBLISHED_AT_FORMAT, VacancyRecord, parse_published_at,
};
