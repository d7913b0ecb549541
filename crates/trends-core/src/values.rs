//! Value normalization: unit-suffixed numbers, clock times and durations.
//!
//! None of these functions fail. Unparseable input becomes
//! [`Reading::Missing`] (or `None`), which reducers treat explicitly.

use std::sync::OnceLock;

use chrono::{NaiveTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Reading;

/// Rendering of a mean duration that had no valid inputs.
pub const UNKNOWN_DURATION: &str = "Unknown";

/// How a value column is coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRule {
    /// Keep as text.
    Text,
    /// Plain number.
    Numeric,
    /// Number followed by a unit suffix, e.g. `" bpm"`.
    NumericWithSuffix(String),
    /// `"Xh Ymin"` → total minutes.
    Duration,
    /// `"HH:MM AM/PM"` → minutes since midnight.
    ClockTime,
}

impl ValueRule {
    /// Apply the rule to a raw cell. `None` means the column stays text.
    pub fn coerce(&self, raw: &str) -> Option<Reading> {
        match self {
            ValueRule::Text => None,
            ValueRule::Numeric => Some(parse_numeric(raw)),
            ValueRule::NumericWithSuffix(suffix) => Some(parse_numeric_with_suffix(raw, suffix)),
            ValueRule::Duration => Some(parse_duration(raw).into()),
            ValueRule::ClockTime => Some(parse_clock_time(raw).into()),
        }
    }
}

// ── Numbers ───────────────────────────────────────────────────────────────────

/// Parse a plain number.
///
/// Thousands separators (`"12,345"`) are accepted since Garmin writes step
/// and calorie counts that way. Blank cells and placeholders like `"--"`
/// are missing.
pub fn parse_numeric(raw: &str) -> Reading {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Reading::Missing;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Reading::Value(v),
        _ => Reading::Missing,
    }
}

/// Strip `suffix` (e.g. `" bpm"`) and parse what remains.
///
/// ```
/// use trends_core::models::Reading;
/// use trends_core::values::parse_numeric_with_suffix;
///
/// assert_eq!(parse_numeric_with_suffix("62 bpm", " bpm"), Reading::Value(62.0));
/// assert_eq!(parse_numeric_with_suffix("-- bpm", " bpm"), Reading::Missing);
/// ```
pub fn parse_numeric_with_suffix(raw: &str, suffix: &str) -> Reading {
    let trimmed = raw.trim();
    let without = trimmed.strip_suffix(suffix.trim()).unwrap_or(trimmed);
    parse_numeric(without)
}

// ── Clock time ────────────────────────────────────────────────────────────────

/// Parse `"HH:MM AM/PM"` into minutes since midnight.
///
/// `"10:45 PM"` → `1365`. Returns `None` on any parse failure.
pub fn parse_clock_time(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    match NaiveTime::parse_from_str(trimmed, "%I:%M %p") {
        Ok(t) => Some(t.hour() * 60 + t.minute()),
        Err(e) => {
            debug!("Unparseable clock time \"{}\": {}", raw, e);
            None
        }
    }
}

// ── Duration ──────────────────────────────────────────────────────────────────

fn duration_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(\d+)\s*h)?\s*(?:(\d+)\s*min)?$").expect("regex is valid")
    })
}

/// Parse `"Xh Ymin"` into total minutes.
///
/// Either component may be absent (`"45min"`, `"8h"`) and defaults to zero,
/// but at least one must be present. Anything else returns `None`.
pub fn parse_duration(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let caps = duration_pattern().captures(trimmed)?;

    let hours = caps.get(1);
    let minutes = caps.get(2);
    if hours.is_none() && minutes.is_none() {
        debug!("Unparseable duration \"{}\"", raw);
        return None;
    }

    let h: u32 = hours.map_or(Some(0), |m| m.as_str().parse().ok())?;
    let m: u32 = minutes.map_or(Some(0), |m| m.as_str().parse().ok())?;
    h.checked_mul(60)?.checked_add(m)
}

/// Render total minutes as `"Xh Ymin"`; the inverse of [`parse_duration`].
///
/// ```
/// use trends_core::values::{parse_duration, render_duration};
///
/// assert_eq!(render_duration(509), "8h 29min");
/// assert_eq!(parse_duration(&render_duration(509)), Some(509));
/// ```
pub fn render_duration(minutes: u32) -> String {
    format!("{}h {}min", minutes / 60, minutes % 60)
}

/// Render a (possibly fractional) mean duration, truncating to whole
/// minutes. A missing mean renders as [`UNKNOWN_DURATION`].
pub fn render_mean_duration(mean: Reading) -> String {
    match mean.value() {
        Some(v) if v >= 0.0 => render_duration(v.trunc() as u32),
        _ => UNKNOWN_DURATION.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
