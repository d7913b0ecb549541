//! CSV output for cleaned tables.

use std::path::Path;

use tracing::debug;
use trends_core::models::{Cell, MetricTable};
use trends_core::{Result, TrendsError};

/// Write `table` to `path` as UTF-8 CSV, replacing any existing file.
///
/// The header row is the date column followed by the value columns. Month
/// labels are written as `"March 2024"` (or their raw text) and missing
/// readings as empty cells.
pub fn write_table(path: &Path, table: &MetricTable) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|source| TrendsError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(table.headers())?;
    for row in &table.rows {
        let record =
            std::iter::once(row.month.to_string()).chain(row.cells.iter().map(Cell::render));
        writer.write_record(record)?;
    }
    writer.flush().map_err(|source| TrendsError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
