// src/services/rates.rs

//! Exchange-rate feed client and rate table construction.
//!
//! The feed is the central bank daily rates document, requested once per
//! month for a fixed reference day. Its quote stands for the whole month.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ExchangeRateTable, FeedConfig, RateQuote, VacancyRecord, YearMonth, month_range};
use crate::utils::http;

/// A source of monthly currency quotes.
#[async_trait]
pub trait RateFeed: Send + Sync {
    /// All quotes published for the month's reference day.
    async fn monthly_quotes(&self, month: YearMonth) -> Result<Vec<RateQuote>>;
}

/// Client for the central bank `XML_daily` document.
pub struct CbrRateFeed {
    client: Client,
    base_url: Url,
    reference_day: u32,
}

impl CbrRateFeed {
    /// Create a feed client with the given configuration.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config)?,
            base_url: Url::parse(&config.base_url)?,
            reference_day: config.reference_day,
        })
    }

    /// Request URL for a month: `?date_req=DD/MM/YYYY`.
    pub fn request_url(&self, month: YearMonth) -> Result<Url> {
        let date = month.day(self.reference_day).ok_or_else(|| {
            AppError::feed(month, format!("day {} does not exist", self.reference_day))
        })?;

        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("date_req", &date.format("%d/%m/%Y").to_string());
        Ok(url)
    }
}

#[async_trait]
impl RateFeed for CbrRateFeed {
    async fn monthly_quotes(&self, month: YearMonth) -> Result<Vec<RateQuote>> {
        let url = self.request_url(month)?;
        log::debug!("Fetching rates for {} from {}", month, url);

        let document = http::fetch_text(&self.client, url.as_str())
            .await
            .map_err(|e| AppError::feed(month, e))?;
        parse_daily_rates(&document)
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::parse(format!("invalid selector '{s}': {e:?}")))
}

fn child_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|node| node.text().collect::<String>().trim().to_string())
}

/// Parse a decimal written with either a comma or a dot.
fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse().ok()
}

/// Parse a `ValCurs` daily rates document.
///
/// Each `Valute` contributes `CharCode`, `Nominal` and `Value` (decimal
/// comma). Entries with unreadable numbers are skipped.
pub fn parse_daily_rates(document: &str) -> Result<Vec<RateQuote>> {
    let html = Html::parse_document(document);
    let valute_sel = parse_selector("valute")?;
    let code_sel = parse_selector("charcode")?;
    let nominal_sel = parse_selector("nominal")?;
    let value_sel = parse_selector("value")?;

    let mut quotes = Vec::new();
    for valute in html.select(&valute_sel) {
        let Some(code) = child_text(&valute, &code_sel).filter(|c| !c.is_empty()) else {
            continue;
        };
        let nominal = child_text(&valute, &nominal_sel).and_then(|n| parse_decimal(&n));
        let value = child_text(&valute, &value_sel).and_then(|v| parse_decimal(&v));

        match (nominal, value) {
            (Some(nominal), Some(value)) => quotes.push(RateQuote {
                code,
                value,
                nominal,
            }),
            _ => log::debug!("Skipping unreadable quote for {}", code),
        }
    }

    Ok(quotes)
}

/// Contiguous months spanned by the corpus publish dates.
pub fn corpus_months(records: &[VacancyRecord]) -> Vec<YearMonth> {
    let first = records.iter().map(VacancyRecord::month).min();
    let last = records.iter().map(VacancyRecord::month).max();
    match (first, last) {
        (Some(first), Some(last)) => month_range(first, last),
        _ => Vec::new(),
    }
}

/// Options for one rate table build.
#[derive(Debug, Clone)]
pub struct RateBuildOptions {
    /// Months fetched at once
    pub concurrency: usize,
    /// Pause after each completed month
    pub delay: Duration,
}

impl From<&FeedConfig> for RateBuildOptions {
    fn from(config: &FeedConfig) -> Self {
        Self {
            concurrency: config.max_concurrent,
            delay: Duration::from_millis(config.request_delay_ms),
        }
    }
}

/// Build the rate table for `currencies` over `months`.
///
/// Months are fetched concurrently. A month whose fetch fails keeps an
/// empty row; it is logged and never retried. A currency missing from a
/// month's document leaves that cell unknown.
pub async fn build_rate_table(
    feed: &dyn RateFeed,
    months: &[YearMonth],
    currencies: &[String],
    options: &RateBuildOptions,
) -> ExchangeRateTable {
    let mut table = ExchangeRateTable::with_currencies(currencies.iter().cloned());
    for month in months {
        table.add_month(*month);
    }

    if currencies.is_empty() {
        log::info!("No foreign currency passed admission; skipping rate feed");
        return table;
    }

    let wanted: BTreeSet<&str> = currencies.iter().map(String::as_str).collect();
    let mut failed_months = 0usize;

    let mut month_stream = stream::iter(months.iter().copied())
        .map(|month| async move { (month, feed.monthly_quotes(month).await) })
        .buffer_unordered(options.concurrency.max(1));

    while let Some((month, result)) = month_stream.next().await {
        match result {
            Ok(quotes) => {
                for quote in quotes.iter().filter(|q| wanted.contains(q.code.as_str())) {
                    match quote.rate() {
                        Some(rate) => table.insert(month, quote.code.clone(), rate),
                        None => log::debug!("Degenerate quote for {} in {}", quote.code, month),
                    }
                }
                for currency in &wanted {
                    if table.rate(month, currency).is_none() {
                        log::debug!("No rate for {} in {}", currency, month);
                    }
                }
            }
            Err(error) => {
                failed_months += 1;
                log::warn!("Rates unavailable for {}: {}", month, error);
            }
        }

        if !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
    }

    log::info!(
        "Rate table: {} months, {} currencies, {} known rates, {} months failed",
        months.len(),
        currencies.len(),
        table.len(),
        failed_months
    );

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::models::parse_published_at;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="windows-1251"?>
<ValCurs Date="12.03.2022" name="Foreign Currency Market">
<Valute ID="R01235"><NumCode>840</NumCode><CharCode>USD</CharCode><Nominal>1</Nominal><Name>US Dollar</Name><Value>120,3785</Value></Valute>
<Valute ID="R01335"><NumCode>398</NumCode><CharCode>KZT</CharCode><Nominal>100</Nominal><Name>Tenge</Name><Value>22,4000</Value></Valute>
<Valute ID="R01239"><NumCode>978</NumCode><CharCode>EUR</CharCode><Nominal>1</Nominal><Name>Euro</Name><Value>n/a</Value></Valute>
</ValCurs>"#;

    struct StaticFeed {
        quotes: HashMap<YearMonth, Vec<RateQuote>>,
    }

    #[async_trait]
    impl RateFeed for StaticFeed {
        async fn monthly_quotes(&self, month: YearMonth) -> Result<Vec<RateQuote>> {
            self.quotes
                .get(&month)
                .cloned()
                .ok_or_else(|| AppError::feed(month, "connection refused"))
        }
    }

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn quote(code: &str, value: f64, nominal: f64) -> RateQuote {
        RateQuote {
            code: code.to_string(),
            value,
            nominal,
        }
    }

    fn options() -> RateBuildOptions {
        RateBuildOptions {
            concurrency: 2,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_parse_daily_rates() {
        let quotes = parse_daily_rates(SAMPLE).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0], quote("USD", 120.3785, 1.0));
        assert_eq!(quotes[1].code, "KZT");
        assert!((quotes[1].rate().unwrap() - 0.224).abs() < 1e-12);
    }

    #[test]
    fn test_request_url_uses_reference_day() {
        let feed = CbrRateFeed::new(&FeedConfig::default()).unwrap();
        let url = feed.request_url(ym("2022-03")).unwrap();
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "date_req");
        assert_eq!(value, "12/03/2022");
    }

    #[test]
    fn test_corpus_months_are_contiguous() {
        let record = |at: &str| VacancyRecord {
            name: "x".to_string(),
            salary_from: None,
            salary_to: None,
            salary_currency: None,
            area_name: "y".to_string(),
            published_at: parse_published_at(at).unwrap(),
        };
        let records = vec![
            record("2021-12-05T00:00:00+0300"),
            record("2021-10-20T00:00:00+0300"),
        ];
        assert_eq!(
            corpus_months(&records),
            vec![ym("2021-10"), ym("2021-11"), ym("2021-12")]
        );
        assert!(corpus_months(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_failed_month_leaves_gap() {
        let feed = StaticFeed {
            quotes: HashMap::from([
                (ym("2022-01"), vec![quote("USD", 75.0, 1.0), quote("GBP", 100.0, 1.0)]),
                (ym("2022-03"), vec![quote("USD", 120.0, 1.0), quote("EUR", 0.0, 0.0)]),
            ]),
        };
        let months = month_range(ym("2022-01"), ym("2022-03"));
        let currencies = vec!["EUR".to_string(), "USD".to_string()];

        let table = build_rate_table(&feed, &months, &currencies, &options()).await;

        assert_eq!(table.rate(ym("2022-01"), "USD"), Some(75.0));
        assert_eq!(table.rate(ym("2022-01"), "EUR"), None);
        assert_eq!(table.rate(ym("2022-01"), "GBP"), None);
        assert_eq!(table.rate(ym("2022-02"), "USD"), None);
        assert_eq!(table.rate(ym("2022-03"), "USD"), Some(120.0));
        assert_eq!(table.rate(ym("2022-03"), "EUR"), None);
        assert_eq!(table.months().count(), 3);
    }

    #[tokio::test]
    async fn test_no_currencies_skips_feed() {
        let feed = StaticFeed {
            quotes: HashMap::new(),
        };
        let months = vec![ym("2020-01")];
        let table = build_rate_table(&feed, &months, &[], &options()).await;
        assert!(table.is_empty());
        assert_eq!(table.months().count(), 1);
    }
}
