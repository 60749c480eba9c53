// src/models/month.rs

//! Calendar month key used by the exchange-rate table.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A calendar month (`YYYY-MM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Create a month, returning `None` when `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Month of a timestamp, taken in the timestamp's own offset.
    pub fn of<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following month.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// A concrete day inside this month.
    pub fn day(self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| AppError::parse(format!("invalid month '{s}', expected YYYY-MM")))?;
        let year: i32 = year
            .parse()
            .map_err(|_| AppError::parse(format!("invalid year in '{s}'")))?;
        let month: u32 = month
            .parse()
            .map_err(|_| AppError::parse(format!("invalid month in '{s}'")))?;
        Self::new(year, month).ok_or_else(|| AppError::parse(format!("month out of range in '{s}'")))
    }
}

impl TryFrom<String> for YearMonth {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Every month from `first` to `last`, inclusive.
///
/// Returns an empty list when `last` precedes `first`.
pub fn month_range(first: YearMonth, last: YearMonth) -> Vec<YearMonth> {
    let mut months = Vec::new();
    let mut current = first;
    while current <= last {
        months.push(current);
        current = current.next();
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_parse_and_display() {
        let month: YearMonth = "2022-03".parse().unwrap();
        assert_eq!(month, YearMonth::new(2022, 3).unwrap());
        assert_eq!(month.to_string(), "2022-03");
        assert!("2022-13".parse::<YearMonth>().is_err());
        assert!("2022".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_month_of_uses_original_offset() {
        let ts = DateTime::parse_from_rfc3339("2022-01-01T01:00:00+03:00").unwrap();
        assert_eq!(YearMonth::of(&ts), YearMonth::new(2022, 1).unwrap());

        // Same instant in UTC falls in the previous month.
        let utc = ts.with_timezone(&FixedOffset::east_opt(0).unwrap());
        assert_eq!(YearMonth::of(&utc), YearMonth::new(2021, 12).unwrap());
    }

    #[test]
    fn test_month_range_crosses_year() {
        let months = month_range(
            YearMonth::new(2021, 11).unwrap(),
            YearMonth::new(2022, 2).unwrap(),
        );
        let labels: Vec<String> = months.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["2021-11", "2021-12", "2022-01", "2022-02"]);
    }

    #[test]
    fn test_month_range_empty_when_reversed() {
        let months = month_range(
            YearMonth::new(2022, 2).unwrap(),
            YearMonth::new(2021, 2).unwrap(),
        );
        assert!(months.is_empty());
    }
}
