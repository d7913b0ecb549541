use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TrendsError};
use crate::models::MissingPolicy;

/// Default export directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data";
/// Default directory for cleaned tables.
pub const DEFAULT_OUTPUT_DIR: &str = "cleaned_data";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Monthly trends from Garmin Connect CSV exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "garmin-trends",
    about = "Monthly trends from Garmin Connect CSV exports",
    version
)]
pub struct Settings {
    /// What to run
    #[arg(
        long,
        default_value = "clean",
        value_parser = ["clean", "inspect", "summary", "correlate", "activity"]
    )]
    pub mode: String,

    /// Directory holding the raw CSV exports
    #[arg(long, env = "GARMIN_TRENDS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory the cleaned monthly tables are written to
    #[arg(long, env = "GARMIN_TRENDS_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Year assigned to exports whose dates carry only a month name
    #[arg(long, value_parser = clap::value_parser!(i32).range(1900..=2100))]
    pub assumed_year: Option<i32>,

    /// Restrict processing to these metrics (comma separated, e.g. "Stress,Sleep")
    #[arg(long, value_delimiter = ',')]
    pub metrics: Vec<String>,

    /// Count unparseable values as zero in monthly sums
    #[arg(long)]
    pub fill_missing_sums: bool,

    /// How monthly tables are joined in correlate mode
    #[arg(long, default_value = "inner", value_parser = ["inner", "left"])]
    pub join: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── PipelineConfig ─────────────────────────────────────────────────────────────

/// Everything the cleaning pipeline needs, passed explicitly to its entry
/// point. `assumed_year` has no default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Year appended to month-only dates.
    pub assumed_year: i32,
    /// What a missing reading contributes to a monthly sum.
    #[serde(default)]
    pub missing_sums: MissingPolicy,
    /// Metric names to process; empty means all.
    #[serde(default)]
    pub metrics: Vec<String>,
}

impl PipelineConfig {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        assumed_year: i32,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
            assumed_year,
            missing_sums: MissingPolicy::default(),
            metrics: Vec::new(),
        }
    }

    pub fn with_missing_sums(mut self, policy: MissingPolicy) -> Self {
        self.missing_sums = policy;
        self
    }

    pub fn with_metrics(mut self, metrics: Vec<String>) -> Self {
        self.metrics = metrics;
        self
    }
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used directories saved to `~/.garmin-trends/last_used.json`.
///
/// The assumed year is deliberately absent: it must be given on every run.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".garmin-trends").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|source| TrendsError::FileWrite {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, fill unset directories from the last run, and
    /// persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// config path, so tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let mut settings = Settings::parse_from(args);

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return settings;
        }

        // CLI (and env) always win over persisted values.
        let last = LastUsedParams::load_from(config_path);
        if settings.data_dir.is_none() {
            settings.data_dir = last.data_dir;
        }
        if settings.output_dir.is_none() {
            settings.output_dir = last.output_dir;
        }

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("Could not persist last-used settings: {}", e);
        }

        settings
    }

    /// Directory of raw exports, falling back to [`DEFAULT_DATA_DIR`].
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Directory of cleaned tables, falling back to [`DEFAULT_OUTPUT_DIR`].
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    /// Build the validated pipeline configuration.
    ///
    /// Fails when `--assumed-year` was not given.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let year = self.assumed_year.ok_or_else(|| {
            TrendsError::Config(
                "--assumed-year is required: month-only export dates carry no year".to_string(),
            )
        })?;

        let policy = if self.fill_missing_sums {
            MissingPolicy::FillZero
        } else {
            MissingPolicy::Exclude
        };

        Ok(
            PipelineConfig::new(self.resolved_data_dir(), self.resolved_output_dir(), year)
                .with_missing_sums(policy)
                .with_metrics(self.metrics.clone()),
        )
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data_dir: s.data_dir.clone(),
            output_dir: s.output_dir.clone(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
