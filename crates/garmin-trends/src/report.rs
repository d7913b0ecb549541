//! Plain-text rendering of pipeline, inspection and statistics results.

use std::fmt::Write as _;

use trends_core::formatting::{format_clock, format_number};
use trends_core::values::render_duration;
use trends_data::pipeline::{MetricStatus, PipelineReport};
use trends_data::reader::FileInspection;
use trends_core::models::MonthLabel;
use trends_data::stats::{
    average_active_days, most_and_least_active, ActivityScore, ColumnSummary, MonthJoin,
    WorkoutFrequency,
};

/// How a column's values read best.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueStyle {
    Count,
    Duration,
    Clock,
}

fn style_for(column: &str) -> ValueStyle {
    match column {
        "avg_duration" => ValueStyle::Duration,
        "avg_bedtime" | "avg_wake_time" => ValueStyle::Clock,
        _ => ValueStyle::Count,
    }
}

fn format_value(value: f64, style: ValueStyle) -> String {
    match style {
        ValueStyle::Count => format_number(value, 1),
        ValueStyle::Duration if value >= 0.0 => render_duration(value.round() as u32),
        ValueStyle::Duration => format_number(value, 0),
        ValueStyle::Clock => format_clock(value),
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub fn render_pipeline_report(report: &PipelineReport) -> String {
    let mut out = String::new();
    for outcome in &report.outcomes {
        let line = match &outcome.status {
            MetricStatus::Written { path, rows } => {
                format!("written  {} ({} rows) -> {}", outcome.metric, rows, path.display())
            }
            MetricStatus::Skipped { reason } => format!("skipped  {}: {}", outcome.metric, reason),
            MetricStatus::Failed { reason } => format!("FAILED   {}: {}", outcome.metric, reason),
        };
        let _ = writeln!(out, "{}", line);
    }
    let _ = writeln!(
        out,
        "{} written, {} skipped, {} failed (assumed year {}, {:.2}s)",
        report.written(),
        report.skipped(),
        report.failed(),
        report.assumed_year,
        report.elapsed_seconds
    );
    out
}

// ── Inspect ───────────────────────────────────────────────────────────────────

pub fn render_inspection(files: &[FileInspection]) -> String {
    let mut out = String::new();
    for file in files {
        let _ = writeln!(out, "{} ({} rows)", file.path.display(), file.rows);
        for (column, missing) in &file.columns {
            let _ = writeln!(out, "  {:<24} {} missing", column, missing);
        }
    }
    out
}

// ── Summary ───────────────────────────────────────────────────────────────────

pub fn render_summary(metric: &str, summaries: &[ColumnSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", metric);
    if summaries.is_empty() {
        let _ = writeln!(out, "  no numeric columns");
        return out;
    }

    for s in summaries {
        let style = style_for(&s.column);
        let std = s
            .std
            .map(|v| format_number(v, 1))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "  {}: n={} mean={} std={} min={} max={}",
            s.column,
            s.count,
            format_value(s.mean, style),
            std,
            format_value(s.min, style),
            format_value(s.max, style),
        );
        let _ = writeln!(out, "    highest: {}  lowest: {}", s.highest, s.lowest);
    }
    out
}

// ── Correlate ─────────────────────────────────────────────────────────────────

pub fn render_correlations(joined: &MonthJoin) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} months joined", joined.len());

    let width = joined
        .columns
        .iter()
        .map(|c| c.len())
        .max()
        .unwrap_or(0)
        .max(6);

    let _ = write!(out, "{:width$}", "", width = width);
    for column in &joined.columns {
        let _ = write!(out, " {:>width$}", column, width = width);
    }
    let _ = writeln!(out);

    for (column, row) in joined.columns.iter().zip(joined.correlation_matrix()) {
        let _ = write!(out, "{:width$}", column, width = width);
        for value in row {
            let cell = value
                .map(|v| format_number(v, 2))
                .unwrap_or_else(|| "n/a".to_string());
            let _ = write!(out, " {:>width$}", cell, width = width);
        }
        let _ = writeln!(out);
    }
    out
}

// ── Activity ──────────────────────────────────────────────────────────────────

pub fn render_activity_scores(
    scores: &[ActivityScore],
    most_steps: Option<(&MonthLabel, f64)>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Activity score (floors x10 + intensity minutes + total calories)");
    for s in scores {
        let _ = writeln!(
            out,
            "  {:<16} {:>10}  floors={} intensity={} calories={}",
            s.month.to_string(),
            format_number(s.score, 0),
            format_number(s.climbed_floors, 0),
            format_number(s.actual, 0),
            format_number(s.total_calories, 0),
        );
    }
    match most_and_least_active(scores) {
        Some((most, least)) => {
            let _ = writeln!(
                out,
                "  most active:  {} ({})",
                most.month,
                format_number(most.score, 0)
            );
            let _ = writeln!(
                out,
                "  least active: {} ({})",
                least.month,
                format_number(least.score, 0)
            );
        }
        None => {
            let _ = writeln!(out, "  no month has floors, intensity and calories");
        }
    }
    if let Some((month, steps)) = most_steps {
        let _ = writeln!(out, "  most steps:   {} ({})", month, format_number(steps, 0));
    }
    out
}

pub fn render_workout_frequency(frequency: &[WorkoutFrequency]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Estimated active days (30 intensity minutes each)");
    for f in frequency {
        let _ = writeln!(
            out,
            "  {:<16} {:>5}  ({} min)",
            f.month.to_string(),
            format_number(f.active_days, 1),
            format_number(f.actual, 0),
        );
    }
    match average_active_days(frequency) {
        Some(avg) => {
            let _ = writeln!(out, "  average: {} days per month", format_number(avg, 1));
        }
        None => {
            let _ = writeln!(out, "  no intensity data");
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use trends_data::pipeline::MetricOutcome;
    use trends_data::schema::Metric;
    use trends_data::stats::{activity_scores, workout_frequency, JoinKind, MonthlySeries};

    fn month(m: u32) -> MonthLabel {
        MonthLabel::month(2024, m).unwrap()
    }

    #[test]
    fn test_render_pipeline_report_counts() {
        let report = PipelineReport {
            generated_at: String::new(),
            assumed_year: 2024,
            outcomes: vec![
                MetricOutcome {
                    metric: Metric::Steps,
                    status: MetricStatus::Written {
                        path: PathBuf::from("out/Steps.csv"),
                        rows: 3,
                    },
                },
                MetricOutcome {
                    metric: Metric::Sleep,
                    status: MetricStatus::Skipped {
                        reason: "source file not found".into(),
                    },
                },
            ],
            elapsed_seconds: 0.0,
        };
        let text = render_pipeline_report(&report);

        assert!(text.contains("written  Steps (3 rows) -> out/Steps.csv"));
        assert!(text.contains("skipped  Sleep: source file not found"));
        assert!(text.contains("1 written, 1 skipped, 0 failed (assumed year 2024"));
    }

    #[test]
    fn test_render_summary_styles_sleep_columns() {
        let summaries = vec![
            ColumnSummary {
                column: "avg_duration".into(),
                count: 2,
                mean: 465.0,
                std: Some(21.2),
                min: 450.0,
                max: 480.0,
                highest: month(1),
                lowest: month(2),
            },
            ColumnSummary {
                column: "avg_bedtime".into(),
                count: 1,
                mean: 1365.0,
                std: None,
                min: 1365.0,
                max: 1365.0,
                highest: month(1),
                lowest: month(1),
            },
        ];
        let text = render_summary("Sleep", &summaries);

        assert!(text.contains("mean=7h 45min"));
        assert!(text.contains("min=7h 30min max=8h 0min"));
        assert!(text.contains("mean=22:45 std=-"));
        assert!(text.contains("highest: January 2024  lowest: February 2024"));
    }

    #[test]
    fn test_render_summary_counts_use_separators() {
        let summaries = vec![ColumnSummary {
            column: "steps".into(),
            count: 1,
            mean: 284_310.0,
            std: None,
            min: 284_310.0,
            max: 284_310.0,
            highest: month(3),
            lowest: month(3),
        }];
        assert!(render_summary("Steps", &summaries).contains("mean=284,310.0"));
    }

    #[test]
    fn test_render_summary_empty() {
        assert!(render_summary("Activities", &[]).contains("no numeric columns"));
    }

    #[test]
    fn test_render_correlations_matrix() {
        let a: MonthlySeries = [(month(1), 1.0), (month(2), 2.0)].into_iter().collect();
        let b: MonthlySeries = [(month(1), 4.0), (month(2), 2.0)].into_iter().collect();
        let joined = MonthJoin::new("stress", &a).join("actual", &b, JoinKind::Inner);

        let text = render_correlations(&joined);
        assert!(text.starts_with("2 months joined"));
        assert!(text.contains("1.00"));
        assert!(text.contains("-1.00"));
    }

    #[test]
    fn test_render_inspection() {
        let files = vec![FileInspection {
            path: PathBuf::from("data/Stress.csv"),
            rows: 12,
            columns: vec![("date".into(), 0), ("stress".into(), 2)],
        }];
        let text = render_inspection(&files);
        assert!(text.contains("data/Stress.csv (12 rows)"));
        assert!(text.contains("2 missing"));
    }

    #[test]
    fn test_render_activity_scores() {
        let floors: MonthlySeries = [(month(1), 30.0), (month(2), 5.0)].into_iter().collect();
        let intensity: MonthlySeries = [(month(1), 150.0), (month(2), 30.0)].into_iter().collect();
        let calories: MonthlySeries =
            [(month(1), 5600.0), (month(2), 2200.0)].into_iter().collect();
        let scores = activity_scores(&floors, &intensity, &calories);
        let march = month(3);

        let text = render_activity_scores(&scores, Some((&march, 284_310.0)));
        assert!(text.contains("most active:  January 2024 (6,050)"));
        assert!(text.contains("least active: February 2024 (2,280)"));
        assert!(text.contains("most steps:   March 2024 (284,310)"));
    }

    #[test]
    fn test_render_activity_scores_empty() {
        let text = render_activity_scores(&[], None);
        assert!(text.contains("no month has floors, intensity and calories"));
        assert!(!text.contains("most steps"));
    }

    #[test]
    fn test_render_workout_frequency() {
        let intensity: MonthlySeries = [(month(1), 150.0), (month(2), 45.0)].into_iter().collect();
        let text = render_workout_frequency(&workout_frequency(&intensity));

        assert!(text.contains("5.0"));
        assert!(text.contains("1.5"));
        assert!(text.contains("average: 3.3 days per month"));
    }
}
