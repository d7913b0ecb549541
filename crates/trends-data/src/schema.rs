//! Declarative per-metric schemas.
//!
//! Each Garmin export maps onto a [`MetricSchema`]: positional column names,
//! how the date column is encoded, how each value column is coerced, and how
//! rows reduce to months. The cleaning engine interprets these records, so a
//! new metric is a new table entry rather than new parsing code.

use std::fmt;

use serde::Serialize;
use trends_core::dates::DateRule;
use trends_core::values::ValueRule;
use trends_core::{Result, TrendsError};

use crate::aggregator::Reduction;

// ── Metric ────────────────────────────────────────────────────────────────────

/// The known Garmin Connect exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Metric {
    Activities,
    AverageHeartRate,
    MaxHeartRate,
    Calories,
    FloorsClimbed,
    IntensityMinutes,
    Stress,
    Sleep,
    Steps,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::Activities,
        Metric::AverageHeartRate,
        Metric::MaxHeartRate,
        Metric::Calories,
        Metric::FloorsClimbed,
        Metric::IntensityMinutes,
        Metric::Stress,
        Metric::Sleep,
        Metric::Steps,
    ];

    /// Display name, matching the export's file stem.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Activities => "Activities",
            Metric::AverageHeartRate => "Average Heart Rate",
            Metric::MaxHeartRate => "Max Heart Rate",
            Metric::Calories => "Calories",
            Metric::FloorsClimbed => "Floors Climbed",
            Metric::IntensityMinutes => "Intensity Minutes",
            Metric::Stress => "Stress",
            Metric::Sleep => "Sleep",
            Metric::Steps => "Steps",
        }
    }

    /// File name of both the raw export and the cleaned table.
    pub fn file_name(self) -> String {
        format!("{}.csv", self.name())
    }

    /// Resolve a user-supplied name. Case, spaces, underscores and hyphens
    /// are ignored, so `"floors_climbed"` and `"Floors Climbed"` both match.
    pub fn from_name(name: &str) -> Result<Metric> {
        let wanted = squash(name);
        Metric::ALL
            .into_iter()
            .find(|m| squash(m.name()) == wanted)
            .ok_or_else(|| TrendsError::UnknownMetric(name.to_string()))
    }

    pub fn schema(self) -> MetricSchema {
        let bpm = || ValueRule::NumericWithSuffix(" bpm".to_string());
        match self {
            Metric::Activities => MetricSchema::new(self, "month", DateRule::AbbreviatedMonth)
                .column(ColumnSpec::new("activity_type", ValueRule::Text))
                .header_marker("Month"),
            Metric::AverageHeartRate => MetricSchema::new(self, "date", DateRule::IsoDate)
                .column(ColumnSpec::new("heart_rate", bpm()))
                .headline("heart_rate"),
            Metric::MaxHeartRate => MetricSchema::new(self, "date", DateRule::IsoDate)
                .column(ColumnSpec::new("max_heart_rate", bpm()))
                .headline("max_heart_rate"),
            Metric::Calories => MetricSchema::new(self, "date", DateRule::AbbreviatedMonth)
                .column(ColumnSpec::new("active_calories", ValueRule::Numeric))
                .column(ColumnSpec::new("resting_calories", ValueRule::Numeric))
                .column(ColumnSpec::new("total_calories", ValueRule::Numeric))
                .reduction(Reduction::Sum)
                .headline("total_calories"),
            Metric::FloorsClimbed => MetricSchema::new(self, "date", DateRule::AbbreviatedMonth)
                .column(ColumnSpec::new("climbed_floors", ValueRule::Numeric))
                .column(ColumnSpec::new("descended_floors", ValueRule::Numeric))
                .reduction(Reduction::Sum)
                .headline("climbed_floors"),
            Metric::IntensityMinutes => MetricSchema::new(self, "date", DateRule::IsoDate)
                .column(ColumnSpec::new("actual", ValueRule::Numeric))
                .column(ColumnSpec::new("goal", ValueRule::Numeric).dropped())
                .reduction(Reduction::Sum)
                .headline("actual"),
            Metric::Stress => MetricSchema::new(self, "date", DateRule::AbbreviatedMonth)
                .column(ColumnSpec::new("stress", ValueRule::Numeric))
                .reduction(Reduction::Mean)
                .headline("stress"),
            Metric::Sleep => MetricSchema::new(self, "date", DateRule::AbbreviatedMonth)
                .column(ColumnSpec::new("avg_duration", ValueRule::Duration).rendered_as_duration())
                .column(ColumnSpec::new("avg_bedtime", ValueRule::ClockTime))
                .column(ColumnSpec::new("avg_wake_time", ValueRule::ClockTime))
                .extra_columns(ExtraColumns::Truncate)
                .reduction(Reduction::Mean)
                .headline("avg_duration"),
            Metric::Steps => MetricSchema::new(self, "date", DateRule::FullDate)
                .column(ColumnSpec::new("steps", ValueRule::Numeric))
                .reduction(Reduction::Sum)
                .headline("steps"),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

// ── Column specs ──────────────────────────────────────────────────────────────

/// How a value column is written after reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputEncoding {
    /// Numbers as numbers, text as text.
    Plain,
    /// Minutes re-encoded as `"Xh Ymin"`; a missing value as `"Unknown"`.
    Duration,
}

/// One positional value column (after the date column).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub rule: ValueRule,
    /// Parsed for the positional contract, then removed from the output.
    pub dropped: bool,
    pub output: OutputEncoding,
}

impl ColumnSpec {
    pub fn new(name: &'static str, rule: ValueRule) -> Self {
        Self {
            name,
            rule,
            dropped: false,
            output: OutputEncoding::Plain,
        }
    }

    pub fn dropped(mut self) -> Self {
        self.dropped = true;
        self
    }

    pub fn rendered_as_duration(mut self) -> Self {
        self.output = OutputEncoding::Duration;
        self
    }
}

/// What to do with columns beyond the schema's positional list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtraColumns {
    /// Any extra column is a schema mismatch.
    Reject,
    /// Keep the leading columns, ignore the rest.
    Truncate,
}

// ── MetricSchema ──────────────────────────────────────────────────────────────

/// The full cleaning contract for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSchema {
    pub metric: Metric,
    /// Name given to the first (date) column.
    pub date_column: &'static str,
    pub date_rule: DateRule,
    /// Value columns in positional order.
    pub columns: Vec<ColumnSpec>,
    pub extra_columns: ExtraColumns,
    /// Drop the first row when its first cell contains this text
    /// (case-insensitive). A genuine row that happens to contain it is
    /// dropped too.
    pub header_marker: Option<&'static str>,
    pub reduction: Reduction,
    /// Column used when the metric is summarized or correlated.
    pub headline: Option<&'static str>,
}

impl MetricSchema {
    fn new(metric: Metric, date_column: &'static str, date_rule: DateRule) -> Self {
        Self {
            metric,
            date_column,
            date_rule,
            columns: Vec::new(),
            extra_columns: ExtraColumns::Reject,
            header_marker: None,
            reduction: Reduction::None,
            headline: None,
        }
    }

    fn column(mut self, spec: ColumnSpec) -> Self {
        self.columns.push(spec);
        self
    }

    fn extra_columns(mut self, extra: ExtraColumns) -> Self {
        self.extra_columns = extra;
        self
    }

    fn header_marker(mut self, marker: &'static str) -> Self {
        self.header_marker = Some(marker);
        self
    }

    fn reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    fn headline(mut self, column: &'static str) -> Self {
        self.headline = Some(column);
        self
    }

    /// Number of positional columns, date column included.
    pub fn expected_columns(&self) -> usize {
        1 + self.columns.len()
    }

    /// Check an export's column count against the positional contract.
    pub fn check_arity(&self, found: usize) -> Result<()> {
        let expected = self.expected_columns();
        let fits = match self.extra_columns {
            ExtraColumns::Reject => found == expected,
            ExtraColumns::Truncate => found >= expected,
        };
        if fits {
            Ok(())
        } else {
            Err(TrendsError::SchemaMismatch {
                metric: self.metric.name().to_string(),
                expected,
                found,
            })
        }
    }

    /// Names of the columns that survive into the output, in order.
    pub fn output_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !c.dropped)
            .map(|c| c.name.to_string())
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_variants() {
        assert_eq!(Metric::from_name("Floors Climbed").unwrap(), Metric::FloorsClimbed);
        assert_eq!(Metric::from_name("floors_climbed").unwrap(), Metric::FloorsClimbed);
        assert_eq!(Metric::from_name("SLEEP").unwrap(), Metric::Sleep);
        assert!(matches!(
            Metric::from_name("Weight").unwrap_err(),
            TrendsError::UnknownMetric(_)
        ));
    }

    #[test]
    fn test_file_names() {
        assert_eq!(Metric::AverageHeartRate.file_name(), "Average Heart Rate.csv");
        assert_eq!(Metric::Steps.file_name(), "Steps.csv");
    }

    #[test]
    fn test_reductions_per_metric() {
        let expected = [
            (Metric::Activities, Reduction::None),
            (Metric::AverageHeartRate, Reduction::None),
            (Metric::MaxHeartRate, Reduction::None),
            (Metric::Calories, Reduction::Sum),
            (Metric::FloorsClimbed, Reduction::Sum),
            (Metric::IntensityMinutes, Reduction::Sum),
            (Metric::Stress, Reduction::Mean),
            (Metric::Sleep, Reduction::Mean),
            (Metric::Steps, Reduction::Sum),
        ];
        for (metric, reduction) in expected {
            assert_eq!(metric.schema().reduction, reduction, "{metric}");
        }
    }

    #[test]
    fn test_intensity_goal_dropped_from_output() {
        let schema = Metric::IntensityMinutes.schema();
        assert_eq!(schema.expected_columns(), 3);
        assert_eq!(schema.output_columns(), vec!["actual"]);
    }

    #[test]
    fn test_check_arity_exact() {
        let schema = Metric::Calories.schema();
        assert!(schema.check_arity(4).is_ok());
        assert!(schema.check_arity(3).is_err());
        assert!(schema.check_arity(5).is_err());
    }

    #[test]
    fn test_check_arity_sleep_truncates() {
        let schema = Metric::Sleep.schema();
        assert!(schema.check_arity(4).is_ok());
        assert!(schema.check_arity(7).is_ok());
        assert!(matches!(
            schema.check_arity(3).unwrap_err(),
            TrendsError::SchemaMismatch {
                expected: 4,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_every_headline_is_an_output_column() {
        for metric in Metric::ALL {
            let schema = metric.schema();
            if let Some(headline) = schema.headline {
                assert!(
                    schema.output_columns().iter().any(|c| c == headline),
                    "{metric}"
                );
            }
        }
    }
}
