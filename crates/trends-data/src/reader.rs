//! CSV discovery and loading.
//!
//! Raw exports are read entirely as text; typing happens later in the
//! cleaning engine. Cleaned tables written by the pipeline can be read back
//! with their month labels re-parsed.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use trends_core::dates::parse_month_label;
use trends_core::models::{
    standardize_column_name, Cell, MetricTable, RawRecordTable, Reading, Record,
};
use trends_core::values::parse_numeric;
use trends_core::{Result, TrendsError};

// ── Public types ──────────────────────────────────────────────────────────────

/// Shape of one export file, as reported by `inspect`.
#[derive(Debug, Clone, Serialize)]
pub struct FileInspection {
    pub path: PathBuf,
    pub rows: usize,
    /// `(standardized column name, blank cell count)` in header order.
    pub columns: Vec<(String, usize)>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `data_path`, sorted by path.
pub fn find_csv_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Read a CSV export fully into memory, every cell as text.
///
/// Header names are standardized (trimmed, lowercased, spaces to
/// underscores). Rows may be ragged; short rows are padded by
/// [`RawRecordTable::column`] on access.
pub fn load_raw_table(path: &Path) -> Result<RawRecordTable> {
    if !path.exists() {
        return Err(TrendsError::MissingInput(path.to_path_buf()));
    }

    let file = std::fs::File::open(path).map_err(|source| TrendsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(file);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(standardize_column_name)
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    debug!(
        "Loaded {}: {} columns, {} rows",
        path.display(),
        headers.len(),
        rows.len()
    );

    Ok(RawRecordTable::new(headers, rows))
}

/// Row count and per-column blank counts for one export.
pub fn inspect_file(path: &Path) -> Result<FileInspection> {
    let table = load_raw_table(path)?;
    Ok(FileInspection {
        path: path.to_path_buf(),
        rows: table.len(),
        columns: table.missing_counts(),
    })
}

/// Inspect every CSV under `data_path`. Unreadable files are logged and
/// left out of the result.
pub fn inspect_directory(data_path: &Path) -> Result<Vec<FileInspection>> {
    if !data_path.exists() {
        return Err(TrendsError::DataPathNotFound(data_path.to_path_buf()));
    }

    let files = find_csv_files(data_path);
    if files.is_empty() {
        return Err(TrendsError::NoDataFiles(data_path.to_path_buf()));
    }

    let mut inspections = Vec::with_capacity(files.len());
    for file in &files {
        match inspect_file(file) {
            Ok(i) => inspections.push(i),
            Err(e) => warn!("Error loading {}: {}", file.display(), e),
        }
    }
    Ok(inspections)
}

/// Read a cleaned table written by the pipeline.
///
/// The first column is parsed back into month labels. Blank cells become
/// missing readings, numeric cells become numbers, anything else (such as
/// `"8h 29min"`) stays text.
pub fn load_cleaned_table(path: &Path) -> Result<MetricTable> {
    let raw = load_raw_table(path)?;
    let Some((date_column, value_columns)) = raw.headers.split_first() else {
        return Err(TrendsError::SchemaMismatch {
            metric: path.display().to_string(),
            expected: 1,
            found: 0,
        });
    };

    let mut table = MetricTable::new(date_column.clone(), value_columns.to_vec());
    for row in &raw.rows {
        let month = parse_month_label(row.first().map(String::as_str).unwrap_or_default());
        let cells = (1..raw.column_count())
            .map(|i| typed_cell(row.get(i).map(String::as_str).unwrap_or_default()))
            .collect();
        table.rows.push(Record { month, cells });
    }
    Ok(table)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn typed_cell(value: &str) -> Cell {
    if value.trim().is_empty() {
        return Cell::Number(Reading::Missing);
    }
    match parse_numeric(value) {
        Reading::Value(v) => Cell::Number(Reading::Value(v)),
        Reading::Missing => Cell::Text(value.to_string()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
