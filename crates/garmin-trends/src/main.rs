mod bootstrap;
mod report;

use std::path::Path;

use anyhow::{bail, Result};
use trends_core::models::MetricTable;
use trends_core::settings::Settings;
use trends_data::pipeline::{run_pipeline, selected_metrics};
use trends_data::reader::{inspect_directory, load_cleaned_table};
use trends_data::schema::Metric;
use trends_data::stats::{
    activity_scores, monthly_series, peak_month, summarize_table, workout_frequency, JoinKind,
    MonthJoin, MonthlySeries,
};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Garmin Trends v{} starting", env!("CARGO_PKG_VERSION"));
    if settings.clear {
        tracing::info!("Saved directories cleared");
    }

    match settings.mode.as_str() {
        "clean" => run_clean(&settings),
        "inspect" => run_inspect(&settings),
        "summary" => run_summary(&settings),
        "correlate" => run_correlate(&settings),
        "activity" => run_activity(&settings),
        unknown => bail!("Unknown mode: {}", unknown),
    }
}

// ── Modes ─────────────────────────────────────────────────────────────────────

fn run_clean(settings: &Settings) -> Result<()> {
    let config = settings.pipeline_config()?;
    tracing::info!(
        "Cleaning {} -> {} (assumed year {})",
        config.data_dir.display(),
        config.output_dir.display(),
        config.assumed_year
    );

    let report = run_pipeline(&config)?;
    print!("{}", report::render_pipeline_report(&report));

    if report.written() == 0 && report.failed() > 0 {
        bail!("no metric could be cleaned");
    }
    Ok(())
}

fn run_inspect(settings: &Settings) -> Result<()> {
    let data_dir = settings.resolved_data_dir();
    tracing::info!("Inspecting {}", data_dir.display());

    let files = inspect_directory(&data_dir)?;
    print!("{}", report::render_inspection(&files));
    Ok(())
}

fn run_summary(settings: &Settings) -> Result<()> {
    let output_dir = settings.resolved_output_dir();

    for metric in selected_metrics(&settings.metrics) {
        let Some(table) = load_cleaned(&output_dir, metric) else {
            continue;
        };
        let summaries = summarize_table(&table);
        println!("{}", report::render_summary(metric.name(), &summaries));
    }
    Ok(())
}

fn run_correlate(settings: &Settings) -> Result<()> {
    let output_dir = settings.resolved_output_dir();
    let kind = JoinKind::from_name(&settings.join).unwrap_or(JoinKind::Inner);

    let mut series: Vec<(&'static str, MonthlySeries)> = Vec::new();
    for metric in selected_metrics(&settings.metrics) {
        let Some(column) = metric.schema().headline else {
            continue;
        };
        let Some(table) = load_cleaned(&output_dir, metric) else {
            continue;
        };
        if let Some(s) = monthly_series(&table, column) {
            series.push((column, s));
        }
    }

    let mut iter = series.iter();
    let Some((first_name, first)) = iter.next() else {
        bail!("no cleaned tables found in {}", output_dir.display());
    };
    if series.len() < 2 {
        bail!("at least two metrics are needed to correlate");
    }

    let mut joined = MonthJoin::new(*first_name, first);
    for (name, s) in iter {
        joined = joined.join(*name, s, kind);
    }
    if kind == JoinKind::Left {
        for (name, _) in &series[1..] {
            joined.forward_fill(name);
        }
    }

    print!("{}", report::render_correlations(&joined));
    Ok(())
}

fn run_activity(settings: &Settings) -> Result<()> {
    let output_dir = settings.resolved_output_dir();
    let series = |metric: Metric, column: &str| {
        load_cleaned(&output_dir, metric).and_then(|t| monthly_series(&t, column))
    };

    let intensity = series(Metric::IntensityMinutes, "actual");
    let steps = series(Metric::Steps, "steps");

    match (
        series(Metric::FloorsClimbed, "climbed_floors"),
        &intensity,
        series(Metric::Calories, "total_calories"),
    ) {
        (Some(floors), Some(intensity), Some(calories)) => {
            let scores = activity_scores(&floors, intensity, &calories);
            let most_steps = steps.as_ref().and_then(peak_month);
            println!("{}", report::render_activity_scores(&scores, most_steps));
        }
        _ => tracing::warn!("activity score needs floors, intensity minutes and calories"),
    }

    let Some(intensity) = intensity else {
        bail!("no cleaned intensity minutes in {}", output_dir.display());
    };
    print!("{}", report::render_workout_frequency(&workout_frequency(&intensity)));
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Load one cleaned table, logging and skipping it when unavailable.
fn load_cleaned(output_dir: &Path, metric: Metric) -> Option<MetricTable> {
    let path = output_dir.join(metric.file_name());
    match load_cleaned_table(&path) {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::warn!("{}: {}", metric, e);
            None
        }
    }
}
