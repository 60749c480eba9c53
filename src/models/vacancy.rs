// src/models/vacancy.rs

//! Vacancy data structures.

use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::models::YearMonth;

/// Currency code that needs no conversion.
pub const BASE_CURRENCY: &str = "RUR";

/// Timestamp layout used by the vacancy exports (`2022-12-20T00:00:00+0300`).
pub const PUBLISHED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Parse a `published_at` value, keeping its original offset.
pub fn parse_published_at(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    DateTime::parse_from_str(value, PUBLISHED_AT_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
}

/// A raw vacancy as read from one CSV row.
#[derive(Debug, Clone, PartialEq)]
pub struct VacancyRecord {
    /// Vacancy title
    pub name: String,

    /// Lower salary bound in `salary_currency`
    pub salary_from: Option<f64>,

    /// Upper salary bound in `salary_currency`
    pub salary_to: Option<f64>,

    /// Currency code (e.g. "RUR", "USD")
    pub salary_currency: Option<String>,

    /// Region / city name
    pub area_name: String,

    /// Publish timestamp with its original offset
    pub published_at: DateTime<FixedOffset>,
}

impl VacancyRecord {
    /// Whether a salary can be derived at all (before any rate lookup).
    pub fn has_salary_fields(&self) -> bool {
        (self.salary_from.is_some() || self.salary_to.is_some()) && self.salary_currency.is_some()
    }

    pub fn year(&self) -> i32 {
        self.published_at.year()
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::of(&self.published_at)
    }
}

/// A vacancy with its salary collapsed to a single RUB value.
///
/// This is also the row layout of the on-disk shards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVacancy {
    pub name: String,
    pub area_name: String,
    pub published_at: DateTime<FixedOffset>,
    pub salary: Option<f64>,
}

impl NormalizedVacancy {
    /// Calendar year in the original publish offset.
    pub fn year(&self) -> i32 {
        self.published_at.year()
    }

    /// Case-sensitive, unanchored substring match on the vacancy name.
    pub fn matches_profession(&self, profession: &str) -> bool {
        self.name.contains(profession)
    }
}
