// src/services/census.rs

//! Currency occurrence counting and the admission threshold.

use std::collections::{BTreeSet, HashMap};

use crate::models::{BASE_CURRENCY, VacancyRecord};

/// Occurrence count of every currency bucket in a corpus.
///
/// A missing currency is its own bucket.
#[derive(Debug, Clone, Default)]
pub struct CurrencyCensus {
    counts: HashMap<Option<String>, usize>,
    total: usize,
}

impl CurrencyCensus {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a VacancyRecord>) -> Self {
        let mut census = Self::default();
        for record in records {
            census.add(record.salary_currency.as_deref());
        }
        census
    }

    pub fn add(&mut self, currency: Option<&str>) {
        *self.counts.entry(currency.map(str::to_string)).or_default() += 1;
        self.total += 1;
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Admission rule for this corpus at `threshold` occurrences.
    pub fn admission(&self, threshold: usize) -> CurrencyAdmission {
        let admitted = self
            .counts
            .iter()
            .filter_map(|(currency, count)| match currency {
                Some(code) if *count >= threshold => Some(code.clone()),
                _ => None,
            })
            .collect();
        CurrencyAdmission { admitted }
    }
}

/// The set of currency codes trusted for conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrencyAdmission {
    admitted: BTreeSet<String>,
}

impl CurrencyAdmission {
    /// Whether a record with this currency stays in the corpus.
    ///
    /// Absent and base currency always pass.
    pub fn admits(&self, currency: Option<&str>) -> bool {
        match currency {
            None => true,
            Some(BASE_CURRENCY) => true,
            Some(code) => self.admitted.contains(code),
        }
    }

    /// Codes that crossed the threshold, base currency included if it did.
    pub fn admitted(&self) -> impl Iterator<Item = &str> {
        self.admitted.iter().map(String::as_str)
    }

    /// Admitted codes that need an exchange rate, sorted.
    pub fn rate_currencies(&self) -> Vec<String> {
        self.admitted
            .iter()
            .filter(|code| code.as_str() != BASE_CURRENCY)
            .cloned()
            .collect()
    }
}
