// src/pipeline/rates.rs

//! Rate table construction step.

use std::path::Path;

use crate::error::Result;
use crate::models::{Config, ExchangeRateTable, VacancyRecord};
use crate::services::{
    CurrencyCensus, RateBuildOptions, RateFeed, build_rate_table, corpus_months, read_vacancies,
};
use crate::storage::CorpusStorage;

/// Fetch the rates needed by `records`.
///
/// Only currencies that pass admission are requested, over the contiguous
/// months spanned by the corpus.
pub async fn build_rates(
    config: &Config,
    feed: &dyn RateFeed,
    records: &[VacancyRecord],
) -> ExchangeRateTable {
    let census = CurrencyCensus::from_records(records);
    let admission = census.admission(config.analysis.currency_threshold);
    let currencies = admission.rate_currencies();
    let months = corpus_months(records);

    log::info!(
        "Census: {} records, admitted {:?} at threshold {}",
        census.total(),
        admission.admitted().collect::<Vec<_>>(),
        config.analysis.currency_threshold
    );
    if let (Some(first), Some(last)) = (months.first(), months.last()) {
        log::info!("Fetching {} currencies for {} .. {}", currencies.len(), first, last);
    }

    build_rate_table(feed, &months, &currencies, &RateBuildOptions::from(&config.feed)).await
}

/// Read the vacancy file, build its rate table and save it.
pub async fn run_rates(
    config: &Config,
    storage: &dyn CorpusStorage,
    feed: &dyn RateFeed,
    input: &Path,
) -> Result<ExchangeRateTable> {
    log::info!("Building rate table from {:?}", input);

    let (records, _) = read_vacancies(input)?;
    let table = build_rates(config, feed, &records).await;
    storage.save_rate_table(&table).await?;

    log::info!("Rate table saved ({} known rates)", table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RateQuote, YearMonth};
    use crate::storage::LocalStorage;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct FixedFeed;

    #[async_trait]
    impl RateFeed for FixedFeed {
        async fn monthly_quotes(&self, _month: YearMonth) -> Result<Vec<RateQuote>> {
            Ok(vec![
                RateQuote {
                    code: "USD".to_string(),
                    value: 60.0,
                    nominal: 1.0,
                },
                RateQuote {
                    code: "EUR".to_string(),
                    value: 70.0,
                    nominal: 1.0,
                },
            ])
        }
    }

    #[tokio::test]
    async fn test_run_rates_requests_admitted_currencies() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("vacancies.csv");
        std::fs::write(
            &input,
            "name,salary_from,salary_to,salary_currency,area_name,published_at\n\
             A,1,2,USD,Москва,2020-01-10T00:00:00+0300\n\
             B,1,2,USD,Москва,2020-03-10T00:00:00+0300\n\
             C,1,2,EUR,Москва,2020-02-10T00:00:00+0300\n\
             D,1,2,RUR,Москва,2020-02-10T00:00:00+0300\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.analysis.currency_threshold = 2;
        let storage = LocalStorage::new(tmp.path());

        let table = run_rates(&config, &storage, &FixedFeed, &input).await.unwrap();

        assert_eq!(table.currencies().collect::<Vec<_>>(), vec!["USD"]);
        assert_eq!(table.months().count(), 3);
        assert_eq!(table.rate(YearMonth::new(2020, 2).unwrap(), "USD"), Some(60.0));

        let saved = storage.load_rate_table().await.unwrap().unwrap();
        assert_eq!(saved.len(), 3);
    }
}
