//! Generic cleaning engine driven by [`MetricSchema`].
//!
//! `raw → normalize → aggregate → encode`. Parse failures never abort a
//! metric: dates fall back to raw labels and values to missing readings.
//! Only a column count that the schema cannot accept is an error.

use tracing::debug;
use trends_core::dates::normalize_dates;
use trends_core::models::{
    Cell, MetricTable, MissingPolicy, NormalizedRecordTable, RawRecordTable, Record,
};
use trends_core::values::render_mean_duration;
use trends_core::Result;

use crate::aggregator::MonthlyAggregator;
use crate::schema::{MetricSchema, OutputEncoding};

/// Applies metric schemas to raw tables with one fixed configuration.
#[derive(Debug, Clone, Copy)]
pub struct MetricCleaner {
    assumed_year: i32,
    missing_sums: MissingPolicy,
}

impl MetricCleaner {
    pub fn new(assumed_year: i32, missing_sums: MissingPolicy) -> Self {
        Self {
            assumed_year,
            missing_sums,
        }
    }

    /// Full cleaning: normalize, reduce per month, then apply output
    /// encodings (durations back to `"Xh Ymin"`).
    pub fn clean(&self, raw: &RawRecordTable, schema: &MetricSchema) -> Result<MetricTable> {
        let normalized = self.normalize(raw, schema)?;
        let mut table =
            MonthlyAggregator::aggregate(&normalized, schema.reduction, self.missing_sums);
        encode_outputs(&mut table, schema);
        Ok(table)
    }

    /// Assign positional column names, drop a leading header row if the
    /// schema has a marker, and coerce dates and values.
    pub fn normalize(
        &self,
        raw: &RawRecordTable,
        schema: &MetricSchema,
    ) -> Result<NormalizedRecordTable> {
        schema.check_arity(raw.column_count())?;

        let rows = strip_header_row(&raw.rows, schema.header_marker);
        let dates: Vec<String> = rows
            .iter()
            .map(|row| row.first().cloned().unwrap_or_default())
            .collect();
        let labels = normalize_dates(&dates, schema.date_rule, self.assumed_year);

        let mut table = MetricTable::new(schema.date_column, schema.output_columns());
        for (row, month) in rows.iter().zip(labels) {
            let cells = schema
                .columns
                .iter()
                .enumerate()
                .filter(|(_, spec)| !spec.dropped)
                .map(|(i, spec)| {
                    let value = row.get(i + 1).map(String::as_str).unwrap_or_default();
                    match spec.rule.coerce(value) {
                        Some(reading) => Cell::Number(reading),
                        None => Cell::Text(value.trim().to_string()),
                    }
                })
                .collect();
            table.rows.push(Record { month, cells });
        }

        debug!(
            "Normalized {}: {} rows, columns {:?}",
            schema.metric,
            table.len(),
            table.columns
        );
        Ok(table)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Skip the first row when its first cell contains `marker`, ignoring case.
fn strip_header_row<'a>(rows: &'a [Vec<String>], marker: Option<&str>) -> &'a [Vec<String>] {
    let Some(marker) = marker else {
        return rows;
    };
    let marker = marker.to_lowercase();
    match rows.first().and_then(|r| r.first()) {
        Some(cell) if cell.to_lowercase().contains(&marker) => {
            debug!("Dropping embedded header row starting with \"{}\"", cell);
            &rows[1..]
        }
        _ => rows,
    }
}

fn encode_outputs(table: &mut MetricTable, schema: &MetricSchema) {
    let duration_columns: Vec<usize> = schema
        .columns
        .iter()
        .filter(|c| !c.dropped && c.output == OutputEncoding::Duration)
        .filter_map(|c| table.column_index(c.name))
        .collect();

    for row in &mut table.rows {
        for &i in &duration_columns {
            if let Some(&Cell::Number(reading)) = row.cells.get(i) {
                row.cells[i] = Cell::Text(render_mean_duration(reading));
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
