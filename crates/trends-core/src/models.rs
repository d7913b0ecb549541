use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::formatting::format_csv_number;

// ── MonthLabel ────────────────────────────────────────────────────────────────

/// Grouping key for a record: a calendar month, or the raw value that could
/// not be parsed into one.
///
/// The derived ordering puts every calendar month before every raw label,
/// months chronologically and raw labels lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MonthLabel {
    /// A parsed calendar month. `month` is 1-based.
    Month { year: i32, month: u32 },
    /// The original input, kept verbatim after a failed parse.
    Raw(String),
}

impl MonthLabel {
    /// Build a calendar-month label; `None` when `month` is outside `1..=12`.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        (1..=12)
            .contains(&month)
            .then_some(MonthLabel::Month { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        MonthLabel::Month {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn raw(value: impl Into<String>) -> Self {
        MonthLabel::Raw(value.into())
    }

    /// `true` for a parsed calendar month. Raw labels are parse failures.
    pub fn is_canonical(&self) -> bool {
        matches!(self, MonthLabel::Month { .. })
    }

    /// First day of the month, for consumers that need a real date key.
    pub fn first_day(&self) -> Option<NaiveDate> {
        match self {
            MonthLabel::Month { year, month } => NaiveDate::from_ymd_opt(*year, *month, 1),
            MonthLabel::Raw(_) => None,
        }
    }

    /// Number of days in the month; `None` for raw labels.
    pub fn days_in_month(&self) -> Option<u32> {
        let first = self.first_day()?;
        let next = first.checked_add_months(Months::new(1))?;
        u32::try_from((next - first).num_days()).ok()
    }
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthLabel::Month { year, month } => {
                let name = u8::try_from(*month)
                    .ok()
                    .and_then(|m| chrono::Month::try_from(m).ok())
                    .map(|m| m.name())
                    .unwrap_or("Unknown");
                write!(f, "{} {}", name, year)
            }
            MonthLabel::Raw(value) => f.write_str(value),
        }
    }
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// A numeric observation that may have failed to parse.
///
/// `Missing` is never the same as zero: reducers decide explicitly what a
/// missing reading contributes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Reading {
    Value(f64),
    #[default]
    Missing,
}

impl Reading {
    pub fn value(self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(v),
            Reading::Missing => None,
        }
    }
}

impl From<Option<f64>> for Reading {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Reading::Missing, Reading::Value)
    }
}

impl From<Option<u32>> for Reading {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Reading::Missing, |v| Reading::Value(f64::from(v)))
    }
}

// ── MissingPolicy ─────────────────────────────────────────────────────────────

/// What a missing reading contributes to a monthly sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Skip missing readings. A month with no valid reading sums to missing.
    #[default]
    Exclude,
    /// Count missing readings as zero. A month with no valid reading sums to 0.
    FillZero,
}

// ── Cell ──────────────────────────────────────────────────────────────────────

/// One typed value column of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Text(String),
    Number(Reading),
}

impl Cell {
    /// The numeric reading, or `None` for text cells.
    pub fn reading(&self) -> Option<Reading> {
        match self {
            Cell::Number(r) => Some(*r),
            Cell::Text(_) => None,
        }
    }

    /// CSV rendering: numbers without a trailing `.0`, missing readings empty.
    pub fn render(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(Reading::Value(v)) => format_csv_number(*v),
            Cell::Number(Reading::Missing) => String::new(),
        }
    }
}

// ── RawRecordTable ────────────────────────────────────────────────────────────

/// An export exactly as read from disk: header text plus untyped rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecordTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawRecordTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Number of positional columns, taken from the header row.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The values in column `index`; short rows yield an empty string.
    pub fn column(&self, index: usize) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.get(index).cloned().unwrap_or_default())
            .collect()
    }

    /// Count of blank cells per column, in header order.
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let blanks = self
                    .rows
                    .iter()
                    .filter(|row| row.get(i).map_or(true, |v| v.trim().is_empty()))
                    .count();
                (name.clone(), blanks)
            })
            .collect()
    }
}

/// Standardize a header: trim, lowercase, spaces to underscores.
///
/// ```
/// use trends_core::models::standardize_column_name;
///
/// assert_eq!(standardize_column_name("  Avg Duration "), "avg_duration");
/// assert_eq!(standardize_column_name("Steps"), "steps");
/// ```
pub fn standardize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

// ── MetricTable ───────────────────────────────────────────────────────────────

/// One row of a normalized or aggregated table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub month: MonthLabel,
    pub cells: Vec<Cell>,
}

/// A table keyed by month label, with named value columns.
///
/// Produced per record by the cleaning engine and per month by the
/// aggregator; both share this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTable {
    /// Name of the month-label column (`"date"` or `"month"`).
    pub date_column: String,
    /// Value column names, in cell order.
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

/// Per-record table after date and value normalization.
pub type NormalizedRecordTable = MetricTable;

/// One row per month label after reduction.
pub type MonthlyAggregateTable = MetricTable;

impl MetricTable {
    pub fn new(date_column: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            date_column: date_column.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header row as written to CSV: the date column, then value columns.
    pub fn headers(&self) -> Vec<String> {
        std::iter::once(self.date_column.clone())
            .chain(self.columns.iter().cloned())
            .collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// `(month, reading)` pairs for a numeric column.
    ///
    /// Text cells in the column are reported as missing.
    pub fn readings(&self, column: &str) -> Option<Vec<(MonthLabel, Reading)>> {
        let idx = self.column_index(column)?;
        Some(
            self.rows
                .iter()
                .map(|r| {
                    let reading = r
                        .cells
                        .get(idx)
                        .and_then(Cell::reading)
                        .unwrap_or(Reading::Missing);
                    (r.month.clone(), reading)
                })
                .collect(),
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
