//! CSV ingest of the lunar and solar event tables.
//!
//! This module is responsible for turning the two scraped-and-split CSV files
//! into ordered, integer-typed rows that are safe to fit.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Ordering check**: the cumulative index must be strictly increasing
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{LunarRow, SolarRow, USEC_LIMIT};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: parsed rows plus the rows that were skipped.
#[derive(Debug, Clone)]
pub struct Table<R> {
    pub rows: Vec<R>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Column names accepted for each field (first match wins).
const LUNAR_COLUMNS: [(&str, &[&str]); 4] = [
    ("cyue", &["cyue"]),
    ("nian", &["nian"]),
    ("ryue", &["ryue"]),
    ("usec", &["usec", "timestamp"]),
];

const SOLAR_COLUMNS: [(&str, &[&str]); 4] = [
    ("cjie", &["cjie"]),
    ("sui", &["sui"]),
    ("jie", &["jie", "jieqi"]),
    ("usec", &["usec", "timestamp"]),
];

/// Load `lunar.csv` (`cyue,nian,ryue,usec`).
pub fn load_lunar(path: &Path) -> Result<Table<LunarRow>, AppError> {
    let file = open(path)?;
    load_lunar_from(file)
}

/// Load `solar.csv` (`cjie,sui,jie,usec`).
pub fn load_solar(path: &Path) -> Result<Table<SolarRow>, AppError> {
    let file = open(path)?;
    load_solar_from(file)
}

pub fn load_lunar_from<R: Read>(reader: R) -> Result<Table<LunarRow>, AppError> {
    let table = load_table(reader, "lunar", &LUNAR_COLUMNS, |[cyue, nian, ryue, usec]| {
        if !(2..=25).contains(&ryue) {
            return Err(format!("`ryue` {ryue} is not a valid month code"));
        }
        check_usec(usec)?;
        Ok(LunarRow { cyue, nian, ryue, usec })
    })?;
    ensure_increasing(&table.rows, "lunar", "cyue", |r| r.cyue)?;
    Ok(table)
}

pub fn load_solar_from<R: Read>(reader: R) -> Result<Table<SolarRow>, AppError> {
    let table = load_table(reader, "solar", &SOLAR_COLUMNS, |[cjie, sui, jie, usec]| {
        if !(0..24).contains(&jie) {
            return Err(format!("`jie` {jie} is outside 0..24"));
        }
        check_usec(usec)?;
        Ok(SolarRow { cjie, sui, jie, usec })
    })?;
    ensure_increasing(&table.rows, "solar", "cjie", |r| r.cjie)?;
    Ok(table)
}

fn check_usec(usec: i64) -> Result<(), String> {
    if (-USEC_LIMIT..=USEC_LIMIT).contains(&usec) {
        Ok(())
    } else {
        Err(format!("`usec` {usec} is outside ±{USEC_LIMIT}"))
    }
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

fn load_table<R, T, F>(
    reader: R,
    label: &str,
    columns: &[(&str, &[&str]); 4],
    build: F,
) -> Result<Table<T>, AppError>
where
    R: Read,
    F: Fn([i64; 4]) -> Result<T, String>,
{
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read {label} CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let mut index = [0usize; 4];
    for (slot, (field, aliases)) in index.iter_mut().zip(columns) {
        *slot = aliases
            .iter()
            .find_map(|a| header_map.get(*a).copied())
            .ok_or_else(|| AppError::new(2, format!("Missing required {label} column: `{field}`")))?;
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_fields(&record, &index, columns))
            .and_then(&build);
        match parsed {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for e in &row_errors {
        tracing::warn!(table = label, line = e.line, "skipped row: {}", e.message);
    }
    if rows.is_empty() {
        return Err(AppError::new(3, format!("No valid rows in the {label} table.")));
    }

    Ok(Table {
        rows,
        row_errors,
        rows_read,
    })
}

fn parse_fields(record: &StringRecord, index: &[usize; 4], columns: &[(&str, &[&str]); 4]) -> Result<[i64; 4], String> {
    let mut out = [0i64; 4];
    for ((slot, &i), (field, _)) in out.iter_mut().zip(index).zip(columns) {
        let raw = record
            .get(i)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("Missing `{field}` value."))?;
        *slot = raw
            .parse::<i64>()
            .map_err(|_| format!("Invalid integer for `{field}`: '{raw}'"))?;
    }
    Ok(out)
}

fn ensure_increasing<T>(rows: &[T], label: &str, field: &str, key: impl Fn(&T) -> i64) -> Result<(), AppError> {
    match rows.windows(2).find(|w| key(&w[0]) >= key(&w[1])) {
        Some(w) => Err(AppError::new(
            3,
            format!(
                "The {label} table is not strictly increasing in `{field}` ({} then {}).",
                key(&w[0]),
                key(&w[1])
            ),
        )),
        None => Ok(()),
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Some tools emit UTF-8 CSVs with a BOM prefix on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}
