// src/services/cities.rs

//! Per-city salary level and vacancy share.

use std::collections::HashMap;

use crate::models::{AnalysisConfig, CityRank, CityStatistic, NormalizedVacancy};

/// Running totals for one city.
#[derive(Debug, Clone)]
struct CityTotals<'a> {
    city: &'a str,
    count: usize,
    sum: f64,
}

impl CityTotals<'_> {
    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Ranks cities over the whole normalized corpus.
///
/// A city is ranked only if it holds at least `floor(total / 100)` of the
/// salary-bearing vacancies. Equal values keep the order in which cities
/// were first seen.
#[derive(Debug, Clone, Copy)]
pub struct CityAggregator {
    top_n: usize,
    share_precision: u32,
}

impl Default for CityAggregator {
    fn default() -> Self {
        Self {
            top_n: 10,
            share_precision: 4,
        }
    }
}

impl CityAggregator {
    pub fn new(top_n: usize, share_precision: u32) -> Self {
        Self {
            top_n,
            share_precision,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.city_top_n, config.share_precision)
    }

    pub fn aggregate<'a>(
        &self,
        records: impl IntoIterator<Item = &'a NormalizedVacancy>,
    ) -> CityStatistic {
        let mut cities: Vec<CityTotals<'a>> = Vec::new();
        let mut index: HashMap<&'a str, usize> = HashMap::new();
        let mut total = 0usize;

        for record in records {
            let Some(salary) = record.salary else {
                continue;
            };
            let slot = *index.entry(record.area_name.as_str()).or_insert_with(|| {
                cities.push(CityTotals {
                    city: &record.area_name,
                    count: 0,
                    sum: 0.0,
                });
                cities.len() - 1
            });
            cities[slot].count += 1;
            cities[slot].sum += salary;
            total += 1;
        }

        if total == 0 {
            return CityStatistic::default();
        }

        let min_count = total / 100;
        cities.retain(|c| c.count >= min_count);
        log::debug!(
            "{} cities with at least {} of {} vacancies",
            cities.len(),
            min_count,
            total
        );

        let mut by_salary = cities.clone();
        by_salary.sort_by(|a, b| b.mean().total_cmp(&a.mean()));
        let salary_level = by_salary
            .iter()
            .take(self.top_n)
            .map(|c| CityRank {
                city: c.city.to_string(),
                value: c.mean().floor() as i64,
            })
            .collect();

        let mut by_count = cities;
        by_count.sort_by(|a, b| b.count.cmp(&a.count));
        let vacancy_share = by_count
            .iter()
            .take(self.top_n)
            .map(|c| CityRank {
                city: c.city.to_string(),
                value: self.round_share(c.count, total),
            })
            .collect();

        CityStatistic {
            salary_level,
            vacancy_share,
        }
    }

    /// `count / total` rounded half to even at `share_precision` digits,
    /// computed on the exact ratio.
    fn round_share(&self, count: usize, total: usize) -> f64 {
        let scale = 10u128.pow(self.share_precision);
        let scaled = count as u128 * scale;
        let total = total as u128;
        let mut digits = scaled / total;
        let twice_rem = (scaled % total) * 2;
        if twice_rem > total || (twice_rem == total && digits % 2 == 1) {
            digits += 1;
        }
        digits as f64 / scale as f64
    }
}
