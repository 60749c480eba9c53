// src/services/normalizer.rs

//! Salary normalization to a single RUB value.

use crate::models::{BASE_CURRENCY, ExchangeRateTable, NormalizedVacancy, VacancyRecord, YearMonth};

/// Converts raw salary fields into RUB using a prebuilt rate table.
#[derive(Debug, Clone, Copy)]
pub struct SalaryNormalizer<'a> {
    rates: &'a ExchangeRateTable,
}

impl<'a> SalaryNormalizer<'a> {
    pub fn new(rates: &'a ExchangeRateTable) -> Self {
        Self { rates }
    }

    /// RUB per unit of `currency` in `month`.
    ///
    /// Base currency is always 1 and never looked up. A missing, zero or
    /// non-positive rate is unknown.
    pub fn rate_for(&self, currency: &str, month: YearMonth) -> Option<f64> {
        if currency == BASE_CURRENCY {
            return Some(1.0);
        }
        self.rates
            .rate(month, currency)
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }

    /// Salary in RUB, or `None` when it cannot be computed.
    pub fn normalize(&self, record: &VacancyRecord) -> Option<f64> {
        if !record.has_salary_fields() {
            return None;
        }
        let currency = record.salary_currency.as_deref()?;
        let amount = match (record.salary_from, record.salary_to) {
            (Some(from), Some(to)) => (from + to) / 2.0,
            (Some(from), None) | (None, Some(from)) => from,
            (None, None) => return None,
        };
        let rate = self.rate_for(currency, record.month())?;
        Some(amount * rate)
    }

    /// Project a raw record onto the normalized layout.
    pub fn normalize_record(&self, record: &VacancyRecord) -> NormalizedVacancy {
        NormalizedVacancy {
            name: record.name.clone(),
            area_name: record.area_name.clone(),
            published_at: record.published_at,
            salary: self.normalize(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_published_at;

    fn record(from: Option<f64>, to: Option<f64>, currency: Option<&str>, at: &str) -> VacancyRecord {
        VacancyRecord {
            name: "Developer".to_string(),
            salary_from: from,
            salary_to: to,
            salary_currency: currency.map(str::to_string),
            area_name: "Москва".to_string(),
            published_at: parse_published_at(at).unwrap(),
        }
    }

    fn table() -> ExchangeRateTable {
        let mut table = ExchangeRateTable::with_currencies(["USD", "EUR", "KZT"]);
        let month = YearMonth::new(2020, 5).unwrap();
        table.insert(month, "USD", 60.0);
        table.insert(month, "KZT", 0.0);
        table
    }

    #[test]
    fn test_bounds_combinations() {
        let rates = table();
        let normalizer = SalaryNormalizer::new(&rates);
        let at = "2020-05-14T12:00:00+0300";

        assert_eq!(normalizer.normalize(&record(Some(1000.0), Some(2000.0), Some("RUR"), at)), Some(1500.0));
        assert_eq!(normalizer.normalize(&record(Some(500.0), None, Some("USD"), at)), Some(30000.0));
        assert_eq!(normalizer.normalize(&record(None, Some(100.0), Some("USD"), at)), Some(6000.0));
        assert_eq!(normalizer.normalize(&record(None, None, Some("RUR"), at)), None);
        assert_eq!(normalizer.normalize(&record(Some(1.0), Some(2.0), None, at)), None);
    }

    #[test]
    fn test_missing_rate_is_unknown() {
        let rates = table();
        let normalizer = SalaryNormalizer::new(&rates);

        // EUR has a column but no value for May
        let eur = record(Some(100.0), None, Some("EUR"), "2020-05-01T00:00:00+0300");
        assert_eq!(normalizer.normalize(&eur), None);

        // USD has no row for June
        let usd = record(Some(100.0), None, Some("USD"), "2020-06-01T00:00:00+0300");
        assert_eq!(normalizer.normalize(&usd), None);

        // Never seen currency
        let gel = record(Some(100.0), None, Some("GEL"), "2020-05-01T00:00:00+0300");
        assert_eq!(normalizer.normalize(&gel), None);
    }

    #[test]
    fn test_zero_rate_is_unknown() {
        let rates = table();
        let normalizer = SalaryNormalizer::new(&rates);
        let kzt = record(Some(100000.0), None, Some("KZT"), "2020-05-01T00:00:00+0300");
        assert_eq!(normalizer.normalize(&kzt), None);
    }

    #[test]
    fn test_base_currency_ignores_table() {
        let mut rates = table();
        rates.insert(YearMonth::new(2020, 5).unwrap(), "RUR", 99.0);
        let normalizer = SalaryNormalizer::new(&rates);

        let rur = record(Some(10.0), Some(30.0), Some("RUR"), "2020-05-01T00:00:00+0300");
        assert_eq!(normalizer.normalize(&rur), Some(20.0));

        let empty = ExchangeRateTable::default();
        assert_eq!(SalaryNormalizer::new(&empty).normalize(&rur), Some(20.0));
    }

    #[test]
    fn test_day_of_month_is_ignored() {
        let rates = table();
        let normalizer = SalaryNormalizer::new(&rates);
        let early = record(Some(1.0), None, Some("USD"), "2020-05-01T00:00:00+0300");
        let late = record(Some(1.0), None, Some("USD"), "2020-05-31T23:59:59+0300");
        assert_eq!(normalizer.normalize(&early), normalizer.normalize(&late));
    }

    #[test]
    fn test_normalize_record_keeps_fields() {
        let rates = table();
        let normalizer = SalaryNormalizer::new(&rates);
        let raw = record(Some(2.0), Some(4.0), Some("USD"), "2020-05-03T09:00:00+0500");
        let normalized = normalizer.normalize_record(&raw);

        assert_eq!(normalized.name, raw.name);
        assert_eq!(normalized.published_at, raw.published_at);
        assert_eq!(normalized.salary, Some(180.0));
        assert_eq!(normalized.year(), 2020);
    }
}
