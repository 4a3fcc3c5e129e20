//! Readings table loading.
//!
//! The lectionary for the year is kept as a tab-separated file, one row per
//! day, produced upstream from the published lectionary PDF:
//!
//! ```text
//! date        dow  title        first        psalm       second  alleluia  gospel       source_pdf
//! 2025-10-19  Sun  29th Sunday  Ex 17:8-13   Ps 121:1-8  2 Tm 3  Heb 4:12  Lk 18:1-8    oct.pdf
//! 2025-10-20  Mon  29th Monday  Rom 4:20-25  Lk 1:69-75          Mt 5:3    Lk 12:13-21  oct.pdf
//! ```
//!
//! Columns are looked up by header name, so their order is free. Extra
//! columns are kept on the row in [`DayReadings::extra`].
//!
//! ## Tolerances
//!
//! PDF extraction is messy, so the loader is forgiving about shape and strict
//! about identity:
//! - every cell is whitespace-normalised ([`norm_spaces`])
//! - blank lines are skipped
//! - short rows are padded with empty cells; surplus cells are ignored
//! - a later row for the same date replaces an earlier one
//! - a non-empty `date` cell that is not `YYYY-MM-DD` is an error
//! - rows with an empty `date` cell are skipped

use crate::naming::norm_spaces;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadingsError {
    #[error("Missing readings file: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Readings file is empty: {0}")]
    Empty(PathBuf),
    #[error("Readings file is missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("Invalid date {value:?} on line {line}")]
    InvalidDate { line: usize, value: String },
}

/// Columns every readings table must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "date", "dow", "title", "first", "psalm", "second", "alleluia", "gospel",
];

/// One day's row from the readings table.
///
/// Citation fields are empty strings when the day has no such reading
/// (most weekdays have no second reading).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayReadings {
    pub date: NaiveDate,
    /// Day of week as written in the table (`Sun`, `Mon`, ...)
    pub dow: String,
    /// Liturgical calendar title
    pub title: String,
    pub first: String,
    pub psalm: String,
    pub second: String,
    pub alleluia: String,
    pub gospel: String,
    /// Any non-required columns, by header name
    pub extra: BTreeMap<String, String>,
}

/// All rows of a readings table, keyed by date.
#[derive(Debug, Default)]
pub struct ReadingsTable {
    rows: BTreeMap<NaiveDate, DayReadings>,
}

impl ReadingsTable {
    pub fn get(&self, date: NaiveDate) -> Option<&DayReadings> {
        self.rows.get(&date)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Dates covered by the table, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }
}

/// Load a readings table from disk.
pub fn load_readings(path: &Path) -> Result<ReadingsTable, ReadingsError> {
    if !path.exists() {
        return Err(ReadingsError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    parse_readings(&content).map_err(|e| match e {
        ReadingsError::Empty(_) => ReadingsError::Empty(path.to_path_buf()),
        other => other,
    })
}

/// Parse readings table content (tab-separated, header row first).
pub fn parse_readings(content: &str) -> Result<ReadingsTable, ReadingsError> {
    let mut lines = content.lines().enumerate();

    let header: Vec<String> = match lines.next() {
        Some((_, line)) if !line.trim().is_empty() => {
            line.split('\t').map(|h| h.trim().to_string()).collect()
        }
        _ => return Err(ReadingsError::Empty(PathBuf::new())),
    };

    let index: BTreeMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();
    for column in REQUIRED_COLUMNS {
        if !index.contains_key(column) {
            return Err(ReadingsError::MissingColumn(*column));
        }
    }

    let mut rows = BTreeMap::new();
    for (line_no, line) in lines {
        if line.trim().is_empty() {
            continue;
        }

        let mut cells: Vec<String> = line.split('\t').map(norm_spaces).collect();
        cells.resize(header.len(), String::new());

        let mut record: BTreeMap<String, String> = header
            .iter()
            .cloned()
            .zip(cells)
            .collect();

        let raw_date = record.remove("date").unwrap_or_default();
        if raw_date.is_empty() {
            continue;
        }
        let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d").map_err(|_| {
            ReadingsError::InvalidDate {
                line: line_no + 1,
                value: raw_date.clone(),
            }
        })?;

        let mut take = |name: &str| record.remove(name).unwrap_or_default();
        let dow = take("dow");
        let title = take("title");
        let first = take("first");
        let psalm = take("psalm");
        let second = take("second");
        let alleluia = take("alleluia");
        let gospel = take("gospel");

        let day = DayReadings {
            date,
            dow,
            title,
            first,
            psalm,
            second,
            alleluia,
            gospel,
            extra: record,
        };

        rows.insert(date, day);
    }

    Ok(ReadingsTable { rows })
}
