//! Batch cleaning pipeline.
//!
//! Runs every selected metric through read → clean → write and reports a
//! per-metric outcome. A failing metric never stops the others.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};
use trends_core::settings::PipelineConfig;
use trends_core::{Result, TrendsError};

use crate::cleaner::MetricCleaner;
use crate::reader::load_raw_table;
use crate::schema::Metric;
use crate::writer::write_table;

// ── Public types ──────────────────────────────────────────────────────────────

/// What happened to one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricStatus {
    /// The cleaned table was written.
    Written { path: PathBuf, rows: usize },
    /// The source export was absent.
    Skipped { reason: String },
    /// The export was present but could not be cleaned or written.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricOutcome {
    pub metric: Metric,
    #[serde(flatten)]
    pub status: MetricStatus,
}

/// Summary of one [`run_pipeline`] call.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// ISO-8601 timestamp when the run finished.
    pub generated_at: String,
    pub assumed_year: i32,
    pub outcomes: Vec<MetricOutcome>,
    /// Wall-clock seconds for the whole run.
    pub elapsed_seconds: f64,
}

impl PipelineReport {
    pub fn written(&self) -> usize {
        self.count(|s| matches!(s, MetricStatus::Written { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, MetricStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, MetricStatus::Failed { .. }))
    }

    pub fn outcome(&self, metric: Metric) -> Option<&MetricStatus> {
        self.outcomes
            .iter()
            .find(|o| o.metric == metric)
            .map(|o| &o.status)
    }

    fn count(&self, pred: impl Fn(&MetricStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Clean every selected metric found in `config.data_dir` and write one
/// CSV per metric to `config.output_dir`.
///
/// Errors only when the data directory is absent or the output directory
/// cannot be created; per-metric problems end up in the report.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    let start = Instant::now();

    if !config.data_dir.is_dir() {
        return Err(TrendsError::DataPathNotFound(config.data_dir.clone()));
    }
    std::fs::create_dir_all(&config.output_dir).map_err(|source| TrendsError::FileWrite {
        path: config.output_dir.clone(),
        source,
    })?;

    let cleaner = MetricCleaner::new(config.assumed_year, config.missing_sums);
    let mut outcomes = Vec::new();

    for metric in selected_metrics(&config.metrics) {
        let status = match process_metric(metric, config, &cleaner) {
            Ok((path, rows)) => {
                info!("{}: wrote {} rows to {}", metric, rows, path.display());
                MetricStatus::Written { path, rows }
            }
            Err(TrendsError::MissingInput(path)) => {
                warn!("{}: source file not found: {}", metric, path.display());
                MetricStatus::Skipped {
                    reason: format!("source file not found: {}", path.display()),
                }
            }
            Err(e) => {
                error!("{}: {}", metric, e);
                MetricStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
        outcomes.push(MetricOutcome { metric, status });
    }

    Ok(PipelineReport {
        generated_at: Utc::now().to_rfc3339(),
        assumed_year: config.assumed_year,
        outcomes,
        elapsed_seconds: start.elapsed().as_secs_f64(),
    })
}

/// Read, clean and write a single metric. Returns the output path and the
/// number of rows written.
pub fn process_metric(
    metric: Metric,
    config: &PipelineConfig,
    cleaner: &MetricCleaner,
) -> Result<(PathBuf, usize)> {
    let source = config.data_dir.join(metric.file_name());
    let raw = load_raw_table(&source)?;
    let table = cleaner.clean(&raw, &metric.schema())?;

    let target = config.output_dir.join(metric.file_name());
    write_table(&target, &table)?;
    Ok((target, table.len()))
}

/// Resolve user-supplied metric names. An empty list selects every metric;
/// unknown names are logged and ignored. Order follows [`Metric::ALL`].
pub fn selected_metrics(names: &[String]) -> Vec<Metric> {
    if names.is_empty() {
        return Metric::ALL.to_vec();
    }

    let mut chosen = Vec::new();
    for name in names {
        match Metric::from_name(name) {
            Ok(metric) => chosen.push(metric),
            Err(e) => warn!("{}", e),
        }
    }
    chosen.sort();
    chosen.dedup();
    chosen
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, lines: &[&str]) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    fn config(dir: &TempDir) -> PipelineConfig {
        PipelineConfig::new(dir.path().join("data"), dir.path().join("out"), 2024)
    }

    // ── selected_metrics ──────────────────────────────────────────────────────

    #[test]
    fn test_selected_metrics_empty_means_all() {
        assert_eq!(selected_metrics(&[]), Metric::ALL.to_vec());
    }

    #[test]
    fn test_selected_metrics_ignores_unknown_and_duplicates() {
        let names = vec![
            "steps".to_string(),
            "Weight".to_string(),
            "Stress".to_string(),
            "STEPS".to_string(),
        ];
        assert_eq!(selected_metrics(&names), vec![Metric::Stress, Metric::Steps]);
    }

    // ── run_pipeline ──────────────────────────────────────────────────────────

    #[test]
    fn test_run_pipeline_missing_data_dir() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            run_pipeline(&config(&dir)).unwrap_err(),
            TrendsError::DataPathNotFound(_)
        ));
    }

    #[test]
    fn test_run_pipeline_skips_absent_exports() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        std::fs::create_dir_all(&config.data_dir).unwrap();
        write_csv(&config.data_dir, "Stress.csv", &["Date,Stress", "Jan,20", "Jan,30"]);

        let report = run_pipeline(&config).unwrap();

        assert_eq!(report.written(), 1);
        assert_eq!(report.skipped(), Metric::ALL.len() - 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.assumed_year, 2024);
        assert!(!report.generated_at.is_empty());

        let written = std::fs::read_to_string(config.output_dir.join("Stress.csv")).unwrap();
        assert_eq!(written, "date,stress\nJanuary 2024,25\n");
    }

    #[test]
    fn test_run_pipeline_isolates_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir).with_metrics(vec!["Steps".into(), "Stress".into()]);
        std::fs::create_dir_all(&config.data_dir).unwrap();
        write_csv(&config.data_dir, "Steps.csv", &["Date", "2024-01-01"]);
        write_csv(&config.data_dir, "Stress.csv", &["Date,Stress", "Feb,40"]);

        let report = run_pipeline(&config).unwrap();

        assert!(matches!(
            report.outcome(Metric::Steps),
            Some(MetricStatus::Failed { .. })
        ));
        assert!(matches!(
            report.outcome(Metric::Stress),
            Some(MetricStatus::Written { rows: 1, .. })
        ));
        assert!(!config.output_dir.join("Steps.csv").exists());
    }

    #[test]
    fn test_report_serializes_status_tag() {
        let report = PipelineReport {
            generated_at: "2024-01-01T00:00:00+00:00".into(),
            assumed_year: 2024,
            outcomes: vec![MetricOutcome {
                metric: Metric::Sleep,
                status: MetricStatus::Skipped {
                    reason: "absent".into(),
                },
            }],
            elapsed_seconds: 0.0,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][0]["status"], "skipped");
        assert_eq!(json["outcomes"][0]["metric"], "Sleep");
    }
}
