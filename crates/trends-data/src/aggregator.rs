//! Monthly aggregation of normalized record tables.
//!
//! Rows sharing a month label collapse into one row; numeric columns are
//! reduced and text columns are dropped.

use std::collections::BTreeMap;

use serde::Serialize;
use trends_core::models::{
    Cell, MissingPolicy, MonthlyAggregateTable, NormalizedRecordTable, Reading, Record,
};

/// How rows of one month reduce to a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reduction {
    /// Rows are kept as they are.
    None,
    Sum,
    Mean,
}

// ── ColumnAccumulator ─────────────────────────────────────────────────────────

/// Running sum and counts for one column within one month.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnAccumulator {
    sum: f64,
    valid: u32,
    missing: u32,
}

impl ColumnAccumulator {
    fn add(&mut self, reading: Reading) {
        match reading {
            Reading::Value(v) => {
                self.sum += v;
                self.valid += 1;
            }
            Reading::Missing => self.missing += 1,
        }
    }

    fn sum(&self, policy: MissingPolicy) -> Reading {
        match policy {
            MissingPolicy::FillZero => Reading::Value(self.sum),
            MissingPolicy::Exclude if self.valid == 0 => Reading::Missing,
            MissingPolicy::Exclude => Reading::Value(self.sum),
        }
    }

    /// Missing readings are left out of both numerator and denominator.
    fn mean(&self) -> Reading {
        if self.valid == 0 {
            Reading::Missing
        } else {
            Reading::Value(self.sum / f64::from(self.valid))
        }
    }
}

// ── MonthlyAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that groups normalized rows by month label.
pub struct MonthlyAggregator;

impl MonthlyAggregator {
    /// Reduce `table` to one row per distinct month label.
    ///
    /// Output rows are ordered by label (calendar months chronologically,
    /// then raw labels), but callers should not rely on any order.
    /// `missing` only affects [`Reduction::Sum`].
    pub fn aggregate(
        table: &NormalizedRecordTable,
        reduction: Reduction,
        missing: MissingPolicy,
    ) -> MonthlyAggregateTable {
        match reduction {
            Reduction::None => table.clone(),
            Reduction::Sum => Self::reduce(table, |acc| acc.sum(missing)),
            Reduction::Mean => Self::reduce(table, ColumnAccumulator::mean),
        }
    }

    /// Sum every numeric column per month.
    pub fn sum_by_month(
        table: &NormalizedRecordTable,
        missing: MissingPolicy,
    ) -> MonthlyAggregateTable {
        Self::aggregate(table, Reduction::Sum, missing)
    }

    /// Average every numeric column per month.
    pub fn mean_by_month(table: &NormalizedRecordTable) -> MonthlyAggregateTable {
        Self::aggregate(table, Reduction::Mean, MissingPolicy::Exclude)
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Indices of columns where no row holds text.
    fn numeric_columns(table: &NormalizedRecordTable) -> Vec<usize> {
        (0..table.columns.len())
            .filter(|&i| {
                table
                    .rows
                    .iter()
                    .all(|r| !matches!(r.cells.get(i), Some(Cell::Text(_))))
            })
            .collect()
    }

    fn reduce(
        table: &NormalizedRecordTable,
        finish: impl Fn(&ColumnAccumulator) -> Reading,
    ) -> MonthlyAggregateTable {
        let numeric = Self::numeric_columns(table);

        let mut groups: BTreeMap<_, Vec<ColumnAccumulator>> = BTreeMap::new();
        for row in &table.rows {
            let accs = groups
                .entry(row.month.clone())
                .or_insert_with(|| vec![ColumnAccumulator::default(); numeric.len()]);
            for (acc, &col) in accs.iter_mut().zip(&numeric) {
                let reading = row
                    .cells
                    .get(col)
                    .and_then(Cell::reading)
                    .unwrap_or(Reading::Missing);
                acc.add(reading);
            }
        }

        let columns = numeric.iter().map(|&i| table.columns[i].clone()).collect();
        let mut out = MonthlyAggregateTable::new(table.date_column.clone(), columns);
        out.rows = groups
            .into_iter()
            .map(|(month, accs)| Record {
                month,
                cells: accs.iter().map(|a| Cell::Number(finish(a))).collect(),
            })
            .collect();
        out
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
