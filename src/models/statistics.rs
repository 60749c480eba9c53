// src/models/statistics.rs

//! Aggregate statistics produced for report renderers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mean salary and vacancy count for one year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearStat {
    /// Arithmetic mean, floored to an integer (0 when `count` is 0)
    pub mean_salary: i64,
    pub count: usize,
}

impl YearStat {
    /// Build from a sequence of salaries.
    pub fn from_salaries(salaries: impl IntoIterator<Item = f64>) -> Self {
        let (sum, count) = salaries
            .into_iter()
            .fold((0.0_f64, 0_usize), |(sum, count), salary| (sum + salary, count + 1));
        Self {
            mean_salary: floor_mean(sum, count),
            count,
        }
    }
}

/// `floor(sum / count)`, or 0 for an empty sample.
pub fn floor_mean(sum: f64, count: usize) -> i64 {
    if count == 0 {
        return 0;
    }
    (sum / count as f64).floor() as i64
}

/// Year-keyed statistics, always iterated in ascending year order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YearStatistic(BTreeMap<i32, YearStat>);

impl YearStatistic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, year: i32, stat: YearStat) {
        self.0.insert(year, stat);
    }

    pub fn get(&self, year: i32) -> Option<&YearStat> {
        self.0.get(&year)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &YearStat)> {
        self.0.iter().map(|(year, stat)| (*year, stat))
    }

    /// Year -> mean salary, the first of the two parallel mappings renderers use.
    pub fn salary_by_year(&self) -> BTreeMap<i32, i64> {
        self.0.iter().map(|(y, s)| (*y, s.mean_salary)).collect()
    }

    /// Year -> vacancy count.
    pub fn count_by_year(&self) -> BTreeMap<i32, usize> {
        self.0.iter().map(|(y, s)| (*y, s.count)).collect()
    }
}

impl FromIterator<(i32, YearStat)> for YearStatistic {
    fn from_iter<T: IntoIterator<Item = (i32, YearStat)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One ranked city entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRank<T> {
    pub city: String,
    pub value: T,
}

/// Ranked city statistics; vector position is the rank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityStatistic {
    /// Mean salary per city, descending
    pub salary_level: Vec<CityRank<i64>>,

    /// Share of all vacancies per city, descending
    pub vacancy_share: Vec<CityRank<f64>>,
}

/// Everything a report renderer needs, as persisted in `statistics.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub profession: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    pub generated_at: DateTime<Utc>,

    pub salary_by_year: BTreeMap<i32, i64>,
    pub count_by_year: BTreeMap<i32, usize>,
    pub profession_salary_by_year: BTreeMap<i32, i64>,
    pub profession_count_by_year: BTreeMap<i32, usize>,

    pub city_salary_level: Vec<CityRank<i64>>,
    pub city_vacancy_share: Vec<CityRank<f64>>,
}

impl StatisticsReport {
    /// Assemble a report from aggregator outputs.
    pub fn new(
        profession: impl Into<String>,
        region: Option<String>,
        overall: &YearStatistic,
        filtered: &YearStatistic,
        cities: CityStatistic,
    ) -> Self {
        Self {
            profession: profession.into(),
            region,
            generated_at: Utc::now(),
            salary_by_year: overall.salary_by_year(),
            count_by_year: overall.count_by_year(),
            profession_salary_by_year: filtered.salary_by_year(),
            profession_count_by_year: filtered.count_by_year(),
            city_salary_level: cities.salary_level,
            city_vacancy_share: cities.vacancy_share,
        }
    }

    /// Human-readable summary lines, one per statistic.
    pub fn lines(&self) -> Vec<String> {
        fn years<T: ToString>(map: &BTreeMap<i32, T>) -> String {
            map.iter()
                .map(|(year, value)| format!("{year}: {}", value.to_string()))
                .collect::<Vec<_>>()
                .join(", ")
        }
        fn cities<T: ToString>(ranks: &[CityRank<T>]) -> String {
            ranks
                .iter()
                .map(|rank| format!("'{}': {}", rank.city, rank.value.to_string()))
                .collect::<Vec<_>>()
                .join(", ")
        }

        vec![
            format!("Salary by year: {{{}}}", years(&self.salary_by_year)),
            format!("Vacancies by year: {{{}}}", years(&self.count_by_year)),
            format!(
                "Salary by year for '{}': {{{}}}",
                self.profession,
                years(&self.profession_salary_by_year)
            ),
            format!(
                "Vacancies by year for '{}': {{{}}}",
                self.profession,
                years(&self.profession_count_by_year)
            ),
            format!("Salary level by city: {{{}}}", cities(&self.city_salary_level)),
            format!("Vacancy share by city: {{{}}}", cities(&self.city_vacancy_share)),
        ]
    }
}
