use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by Garmin Trends.
#[derive(Error, Debug)]
pub enum TrendsError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cleaned table could not be written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be parsed or serialized.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The export file for a metric does not exist.
    #[error("Input file not found: {0}")]
    MissingInput(PathBuf),

    /// The export's column count cannot be mapped onto the metric's schema.
    #[error("Schema mismatch for {metric}: expected {expected} columns, found {found}")]
    SchemaMismatch {
        metric: String,
        expected: usize,
        found: usize,
    },

    /// The expected data directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// No CSV exports were found under the given directory.
    #[error("No CSV files found in {0}")]
    NoDataFiles(PathBuf),

    /// A metric name did not match any known schema.
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the trends crates.
pub type Result<T> = std::result::Result<T, TrendsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = TrendsError::FileRead {
            path: PathBuf::from("/exports/Stress.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/exports/Stress.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_missing_input() {
        let err = TrendsError::MissingInput(PathBuf::from("data/Sleep.csv"));
        assert_eq!(err.to_string(), "Input file not found: data/Sleep.csv");
    }

    #[test]
    fn test_error_display_schema_mismatch() {
        let err = TrendsError::SchemaMismatch {
            metric: "Calories".to_string(),
            expected: 4,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "Schema mismatch for Calories: expected 4 columns, found 2"
        );
    }

    #[test]
    fn test_error_display_no_data_files() {
        let err = TrendsError::NoDataFiles(PathBuf::from("/empty/dir"));
        assert_eq!(err.to_string(), "No CSV files found in /empty/dir");
    }

    #[test]
    fn test_error_display_unknown_metric() {
        let err = TrendsError::UnknownMetric("Weight".to_string());
        assert_eq!(err.to_string(), "Unknown metric: Weight");
    }

    #[test]
    fn test_error_display_config() {
        let err = TrendsError::Config("assumed year is required".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: assumed year is required"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: TrendsError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: TrendsError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
