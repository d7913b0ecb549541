//! Descriptive statistics, month joins, correlations and activity estimates
//! over cleaned tables.
//!
//! Everything here works on canonical month labels only. Rows whose month
//! could not be parsed are reported by [`summarize_table`] but never joined.

use std::collections::BTreeMap;

use serde::Serialize;
use trends_core::models::{Cell, MetricTable, MonthLabel, Reading};
use trends_core::values::{parse_duration, parse_numeric};

/// Monthly values of one column, keyed chronologically.
pub type MonthlySeries = BTreeMap<MonthLabel, f64>;

// ── Descriptive statistics ────────────────────────────────────────────────────

/// Statistics for one numeric column of a cleaned table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    /// Number of valid values.
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    /// Month holding the largest value (first one on ties).
    pub highest: MonthLabel,
    /// Month holding the smallest value (first one on ties).
    pub lowest: MonthLabel,
}

/// Numeric value of a cell. Text cells are tried as `"Xh Ymin"` durations,
/// then as plain numbers.
pub fn cell_value(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(reading) => reading.value(),
        Cell::Text(text) => parse_duration(text)
            .map(f64::from)
            .or_else(|| parse_numeric(text).value()),
    }
}

/// Summarize every column that holds at least one numeric value.
pub fn summarize_table(table: &MetricTable) -> Vec<ColumnSummary> {
    table
        .columns
        .iter()
        .enumerate()
        .filter_map(|(i, column)| {
            let values: Vec<(&MonthLabel, f64)> = table
                .rows
                .iter()
                .filter_map(|r| r.cells.get(i).and_then(cell_value).map(|v| (&r.month, v)))
                .collect();
            summarize_values(column, &values)
        })
        .collect()
}

fn summarize_values(column: &str, values: &[(&MonthLabel, f64)]) -> Option<ColumnSummary> {
    let (first_month, first) = *values.first()?;
    let count = values.len();
    let mean = values.iter().map(|(_, v)| v).sum::<f64>() / count as f64;

    let std = (count > 1).then(|| {
        let ss: f64 = values.iter().map(|(_, v)| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    });

    let (mut highest, mut max) = (first_month, first);
    let (mut lowest, mut min) = (first_month, first);
    for &(month, v) in &values[1..] {
        if v > max {
            max = v;
            highest = month;
        }
        if v < min {
            min = v;
            lowest = month;
        }
    }

    Some(ColumnSummary {
        column: column.to_string(),
        count,
        mean,
        std,
        min,
        max,
        highest: highest.clone(),
        lowest: lowest.clone(),
    })
}

/// One value per canonical month for `column`.
///
/// Months with several rows (pass-through tables such as heart rate) are
/// averaged. Returns `None` when the column does not exist.
pub fn monthly_series(table: &MetricTable, column: &str) -> Option<MonthlySeries> {
    let idx = table.column_index(column)?;

    let mut sums: BTreeMap<MonthLabel, (f64, u32)> = BTreeMap::new();
    for row in table.rows.iter().filter(|r| r.month.is_canonical()) {
        if let Some(v) = row.cells.get(idx).and_then(cell_value) {
            let entry = sums.entry(row.month.clone()).or_default();
            entry.0 += v;
            entry.1 += 1;
        }
    }

    Some(
        sums.into_iter()
            .map(|(month, (sum, n))| (month, sum / f64::from(n)))
            .collect(),
    )
}

// ── Joins ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JoinKind {
    /// Keep months present on both sides.
    Inner,
    /// Keep every month of the left side; absent values are missing.
    Left,
}

impl JoinKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "inner" => Some(JoinKind::Inner),
            "left" => Some(JoinKind::Left),
            _ => None,
        }
    }
}

/// Several monthly series aligned on the month key.
///
/// Built left to right like a chain of merges: the first series fixes the
/// starting month set and each [`MonthJoin::join`] narrows (inner) or keeps
/// (left) it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthJoin {
    pub columns: Vec<String>,
    pub months: Vec<MonthLabel>,
    /// `rows[i][j]` is column `j` in month `months[i]`.
    pub rows: Vec<Vec<Reading>>,
}

impl MonthJoin {
    pub fn new(column: impl Into<String>, series: &MonthlySeries) -> Self {
        Self {
            columns: vec![column.into()],
            months: series.keys().cloned().collect(),
            rows: series.values().map(|v| vec![Reading::Value(*v)]).collect(),
        }
    }

    /// Join another series. Non-overlapping month sets are fine: an inner
    /// join may end up empty, a left join fills with missing readings.
    pub fn join(
        mut self,
        column: impl Into<String>,
        series: &MonthlySeries,
        kind: JoinKind,
    ) -> Self {
        let mut months = Vec::with_capacity(self.months.len());
        let mut rows = Vec::with_capacity(self.rows.len());

        for (month, mut row) in self.months.into_iter().zip(self.rows) {
            match (series.get(&month), kind) {
                (Some(v), _) => row.push(Reading::Value(*v)),
                (None, JoinKind::Left) => row.push(Reading::Missing),
                (None, JoinKind::Inner) => continue,
            }
            months.push(month);
            rows.push(row);
        }

        self.columns.push(column.into());
        self.months = months;
        self.rows = rows;
        self
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Readings of one column in month order.
    pub fn column(&self, name: &str) -> Option<Vec<Reading>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Replace missing readings in `column` with the last value above.
    /// Leading gaps stay missing. Returns `false` for an unknown column.
    pub fn forward_fill(&mut self, column: &str) -> bool {
        let Some(idx) = self.columns.iter().position(|c| c == column) else {
            return false;
        };
        let mut last = Reading::Missing;
        for row in &mut self.rows {
            match row[idx] {
                Reading::Value(_) => last = row[idx],
                Reading::Missing => row[idx] = last,
            }
        }
        true
    }

    /// Pairwise Pearson correlations between all columns.
    pub fn correlation_matrix(&self) -> Vec<Vec<Option<f64>>> {
        let columns: Vec<Vec<Reading>> = (0..self.columns.len())
            .map(|j| self.rows.iter().map(|r| r[j]).collect())
            .collect();

        columns
            .iter()
            .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
            .collect()
    }
}

// ── Correlation ───────────────────────────────────────────────────────────────

/// Pearson correlation over the positions where both readings are present.
///
/// `None` with fewer than two complete pairs or when either side has zero
/// variance.
pub fn pearson(xs: &[Reading], ys: &[Reading]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some((x.value()?, y.value()?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

// ── Activity ──────────────────────────────────────────────────────────────────

/// Score weight of one climbed floor.
const FLOOR_WEIGHT: f64 = 10.0;

/// Intensity minutes that count as one active day.
pub const MINUTES_PER_ACTIVE_DAY: f64 = 30.0;

/// Composite activity score of one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityScore {
    pub month: MonthLabel,
    pub climbed_floors: f64,
    pub actual: f64,
    pub total_calories: f64,
    /// `climbed_floors * 10 + actual + total_calories`.
    pub score: f64,
}

/// Score every month present in all three series, chronologically.
pub fn activity_scores(
    floors: &MonthlySeries,
    intensity: &MonthlySeries,
    calories: &MonthlySeries,
) -> Vec<ActivityScore> {
    let joined = MonthJoin::new("climbed_floors", floors)
        .join("actual", intensity, JoinKind::Inner)
        .join("total_calories", calories, JoinKind::Inner);

    joined
        .months
        .iter()
        .zip(&joined.rows)
        .filter_map(|(month, row)| {
            let (climbed_floors, actual, total_calories) =
                (row[0].value()?, row[1].value()?, row[2].value()?);
            Some(ActivityScore {
                month: month.clone(),
                climbed_floors,
                actual,
                total_calories,
                score: climbed_floors * FLOOR_WEIGHT + actual + total_calories,
            })
        })
        .collect()
}

/// Highest and lowest scoring months (first one on ties).
pub fn most_and_least_active(
    scores: &[ActivityScore],
) -> Option<(&ActivityScore, &ActivityScore)> {
    let first = scores.first()?;
    let (mut most, mut least) = (first, first);
    for s in &scores[1..] {
        if s.score > most.score {
            most = s;
        }
        if s.score < least.score {
            least = s;
        }
    }
    Some((most, least))
}

/// Month with the largest value (first one on ties).
pub fn peak_month(series: &MonthlySeries) -> Option<(&MonthLabel, f64)> {
    series.iter().fold(None, |best, (month, &v)| match best {
        Some((_, b)) if b >= v => best,
        _ => Some((month, v)),
    })
}

/// Estimated number of workout days in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutFrequency {
    pub month: MonthLabel,
    pub actual: f64,
    /// `actual / 30`, never more than the days in the month.
    pub active_days: f64,
}

pub fn workout_frequency(intensity: &MonthlySeries) -> Vec<WorkoutFrequency> {
    intensity
        .iter()
        .filter_map(|(month, &actual)| {
            let days = month.days_in_month()?;
            Some(WorkoutFrequency {
                month: month.clone(),
                actual,
                active_days: (actual / MINUTES_PER_ACTIVE_DAY).min(f64::from(days)),
            })
        })
        .collect()
}

/// Mean active days per month; `None` with no months.
pub fn average_active_days(frequency: &[WorkoutFrequency]) -> Option<f64> {
    if frequency.is_empty() {
        return None;
    }
    Some(frequency.iter().map(|f| f.active_days).sum::<f64>() / frequency.len() as f64)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
