// src/models/rates.rs

//! Monthly currency-to-RUB exchange-rate table.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};

use crate::error::{AppError, Result};
use crate::models::YearMonth;

/// One currency quote from a daily rates document.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    /// ISO currency code (e.g. "USD")
    pub code: String,

    /// RUB value of `nominal` units
    pub value: f64,

    /// Number of currency units the value refers to
    pub nominal: f64,
}

impl RateQuote {
    /// RUB per one unit of the currency, or `None` for degenerate quotes.
    pub fn rate(&self) -> Option<f64> {
        if self.nominal == 0.0 {
            return None;
        }
        let rate = self.value / self.nominal;
        rate.is_finite().then_some(rate)
    }
}

/// Immutable-after-build table of `(month, currency) -> rate`.
///
/// Multiplying an amount in the currency by its rate yields RUB. A missing
/// cell means the rate is unknown for that month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExchangeRateTable {
    months: BTreeSet<YearMonth>,
    currencies: BTreeSet<String>,
    rates: BTreeMap<YearMonth, BTreeMap<String, f64>>,
}

impl ExchangeRateTable {
    /// Create an empty table that tracks the given currency columns.
    pub fn with_currencies<I, S>(currencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            currencies: currencies.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Register a month row, even if no rate is known for it.
    pub fn add_month(&mut self, month: YearMonth) {
        self.months.insert(month);
    }

    /// Set the rate for a `(month, currency)` cell.
    pub fn insert(&mut self, month: YearMonth, currency: impl Into<String>, rate: f64) {
        let currency = currency.into();
        self.months.insert(month);
        self.currencies.insert(currency.clone());
        self.rates.entry(month).or_default().insert(currency, rate);
    }

    /// Stored rate for a cell, `None` if unknown.
    pub fn rate(&self, month: YearMonth, currency: &str) -> Option<f64> {
        self.rates.get(&month)?.get(currency).copied()
    }

    pub fn months(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.months.iter().copied()
    }

    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.currencies.iter().map(String::as_str)
    }

    /// Number of known cells.
    pub fn len(&self) -> usize {
        self.rates.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write as CSV: `date,<CUR>...`, one row per month, empty cell when unknown.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);

        let mut header = vec!["date".to_string()];
        header.extend(self.currencies.iter().cloned());
        csv.write_record(&header)?;

        for month in &self.months {
            let mut row = vec![month.to_string()];
            for currency in &self.currencies {
                row.push(
                    self.rate(*month, currency)
                        .map(|rate| rate.to_string())
                        .unwrap_or_default(),
                );
            }
            csv.write_record(&row)?;
        }

        csv.flush()?;
        Ok(())
    }

    /// Read a table previously written by [`ExchangeRateTable::write_csv`].
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);
        let headers = csv.headers()?.clone();

        if headers.get(0).map(str::trim) != Some("date") {
            return Err(AppError::parse("rate table must start with a 'date' column"));
        }
        let currencies: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();
        let mut table = Self::with_currencies(currencies.iter().cloned());

        for row in csv.records() {
            let row = row?;
            let month: YearMonth = row.get(0).unwrap_or_default().parse()?;
            table.add_month(month);

            for (currency, cell) in currencies.iter().zip(row.iter().skip(1)) {
                let cell = cell.trim();
                if cell.is_empty() {
                    continue;
                }
                let rate: f64 = cell.parse().map_err(|_| {
                    AppError::parse(format!("invalid rate '{cell}' for {currency} in {month}"))
                })?;
                table.insert(month, currency.clone(), rate);
            }
        }

        Ok(table)
    }
}
