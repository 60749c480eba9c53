// src/services/reader.rs

//! Raw vacancy CSV reader.
//!
//! Turns an exported vacancy table into [`VacancyRecord`]s. Columns are found
//! by header name, so extra columns (description, key_skills, ...) are
//! tolerated. Malformed rows are dropped and counted, never returned as errors.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::error::{AppError, Result};
use crate::models::{VacancyRecord, parse_published_at};
use crate::utils::clean_cell;

/// Outcome counters of one CSV read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Data rows seen (header excluded)
    pub rows_read: usize,
    /// Rows dropped as malformed
    pub rows_dropped: usize,
}

/// Positions of the required columns.
#[derive(Debug, Clone, Copy)]
struct Columns {
    name: usize,
    salary_from: usize,
    salary_to: usize,
    salary_currency: usize,
    area_name: usize,
    published_at: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == column)
                .ok_or_else(|| AppError::validation(format!("missing required column '{column}'")))
        };

        Ok(Self {
            name: find("name")?,
            salary_from: find("salary_from")?,
            salary_to: find("salary_to")?,
            salary_currency: find("salary_currency")?,
            area_name: find("area_name")?,
            published_at: find("published_at")?,
        })
    }
}

/// Read vacancies from a CSV file.
pub fn read_vacancies(path: impl AsRef<Path>) -> Result<(Vec<VacancyRecord>, IngestReport)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        AppError::config(format!("cannot open vacancy file {}: {e}", path.display()))
    })?;
    read_vacancies_from(file)
}

/// Read vacancies from any CSV source.
pub fn read_vacancies_from<R: Read>(reader: R) -> Result<(Vec<VacancyRecord>, IngestReport)> {
    let mut csv = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    let mut report = IngestReport::default();

    if headers.is_empty() {
        log::warn!("Vacancy file is empty");
        return Ok((Vec::new(), report));
    }
    let columns = Columns::locate(&headers)?;

    let mut records = Vec::new();
    for row in csv.records() {
        report.rows_read += 1;

        let parsed = match row {
            Ok(row) if row.len() == headers.len() => parse_row(&row, &columns),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Unreadable CSV row: {}", e);
                None
            }
        };

        match parsed {
            Some(record) => records.push(record),
            None => report.rows_dropped += 1,
        }
    }

    log::info!(
        "Read {} vacancies ({} malformed rows dropped)",
        records.len(),
        report.rows_dropped
    );

    Ok((records, report))
}

/// Convert one well-sized row, or `None` if a field is unusable.
fn parse_row(row: &StringRecord, columns: &Columns) -> Option<VacancyRecord> {
    let cell = |index: usize| clean_cell(row.get(index).unwrap_or(""));
    let required = |index: usize| Some(cell(index)).filter(|value| !value.is_empty());

    let name = required(columns.name)?;
    let area_name = required(columns.area_name)?;
    let published_at = parse_published_at(&required(columns.published_at)?)?;

    let salary_from = parse_amount(&cell(columns.salary_from))?;
    let salary_to = parse_amount(&cell(columns.salary_to))?;
    let salary_currency = Some(cell(columns.salary_currency)).filter(|c| !c.is_empty());

    Some(VacancyRecord {
        name,
        salary_from,
        salary_to,
        salary_currency,
        area_name,
        published_at,
    })
}

/// `Some(None)` for an empty cell, `None` for a malformed amount.
fn parse_amount(value: &str) -> Option<Option<f64>> {
    if value.is_empty() {
        return Some(None);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .map(Some)
}
