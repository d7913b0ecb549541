//! Date normalization: heterogeneous export dates → canonical month labels.
//!
//! Garmin exports encode dates three ways: a bare abbreviated month with no
//! year (`"Jan"`, `"Mar 5"`), a full calendar date (`"2024-03-05"`), or an
//! already-normalized month-year (`"March 2024"`). Every form maps to a
//! [`MonthLabel`]; anything unparseable is kept verbatim as
//! [`MonthLabel::Raw`].

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::MonthLabel;

/// How a metric's date column is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRule {
    /// Month abbreviation without a year; the configured assumed year is
    /// appended when no value in the column carries a year of its own.
    AbbreviatedMonth,
    /// `YYYY-MM-DD`, optionally with a time component. Values in any other
    /// layout [`DateRule::FullDate`] accepts (`"March 2024"`, `"03/05/2024"`)
    /// land in the same month.
    IsoDate,
    /// Any common calendar-date layout (ISO, US slash, long-form names).
    FullDate,
}

/// ISO layouts, tried before the lenient ones.
const ISO_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Extra layouts accepted by [`DateRule::FullDate`].
const LENIENT_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

fn year_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}").expect("regex is valid"))
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Normalize a date column according to `rule`.
///
/// The result has the same length and order as `values`. `assumed_year` is
/// only consulted by [`DateRule::AbbreviatedMonth`].
pub fn normalize_dates(values: &[String], rule: DateRule, assumed_year: i32) -> Vec<MonthLabel> {
    let labels = match rule {
        DateRule::AbbreviatedMonth => format_month_year(values, assumed_year),
        DateRule::IsoDate | DateRule::FullDate => values
            .iter()
            .map(|v| label_or_raw(v, parse_full_date(v)))
            .collect(),
    };

    let unparsed = labels.iter().filter(|l| !l.is_canonical()).count();
    if unparsed > 0 {
        warn!(
            "{} of {} dates could not be parsed ({:?}); keeping raw values",
            unparsed,
            values.len(),
            rule
        );
    }
    labels
}

/// Convert a column of abbreviated-month dates to month labels.
///
/// With no 4-digit year anywhere in the column, each value is cut to its
/// first three characters and `assumed_year` is appended (`"Mar 5"` →
/// `"Mar 2024"`). The year is a fixed assumption: an export spanning a year
/// boundary is mislabelled, so the caller must supply it explicitly.
///
/// A column that already carries years is parsed as month-year text or any
/// full date. Values that still do not parse keep their original text.
pub fn format_month_year(values: &[String], assumed_year: i32) -> Vec<MonthLabel> {
    let column_has_year = values.iter().any(|v| year_pattern().is_match(v));

    values
        .iter()
        .map(|value| {
            let parsed = if column_has_year {
                parse_month_year(value).or_else(|| parse_full_date(value))
            } else {
                let abbrev: String = value.trim().chars().take(3).collect();
                parse_month_year(&format!("{} {}", abbrev, assumed_year))
            };
            label_or_raw(value, parsed)
        })
        .collect()
}

/// Parse `"March 2024"` or `"Mar 2024"` (case-insensitive) into a label.
pub fn parse_month_year(value: &str) -> Option<MonthLabel> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    // `%B` accepts both full names and three-letter abbreviations.
    NaiveDate::parse_from_str(&format!("1 {}", trimmed), "%d %B %Y")
        .ok()
        .map(MonthLabel::from_date)
}

/// Parse an ISO `YYYY-MM-DD` date (with optional time) into a label.
pub fn parse_iso_date(value: &str) -> Option<MonthLabel> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(MonthLabel::from_date(dt.date_naive()));
    }

    parse_with_formats(trimmed, ISO_FORMATS)
}

/// Parse any supported calendar-date layout into a label.
///
/// Falls back to month-year text so that an already-cleaned column maps to
/// the same labels again.
pub fn parse_full_date(value: &str) -> Option<MonthLabel> {
    parse_iso_date(value)
        .or_else(|| parse_with_formats(value.trim(), LENIENT_FORMATS))
        .or_else(|| parse_month_year(value))
}

/// Re-read a month label written by the pipeline (`"March 2024"`).
///
/// Anything else comes back as a raw label, mirroring how it was written.
pub fn parse_month_label(value: &str) -> MonthLabel {
    parse_month_year(value).unwrap_or_else(|| MonthLabel::raw(value))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn parse_with_formats(value: &str, formats: &[&str]) -> Option<MonthLabel> {
    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(MonthLabel::from_date(date));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(MonthLabel::from_date(dt.date()));
        }
    }
    None
}

fn label_or_raw(original: &str, parsed: Option<MonthLabel>) -> MonthLabel {
    parsed.unwrap_or_else(|| {
        debug!("Unparseable date \"{}\" kept verbatim", original);
        MonthLabel::raw(original)
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
