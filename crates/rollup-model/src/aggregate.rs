use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::{AggregateError, ColumnIndices, GroupSummary, Rollup};

/// Read-only view of one data row.
pub trait RowCells {
    fn cell_count(&self) -> usize;
    fn cell(&self, index: usize) -> Option<&str>;
}

impl RowCells for csv::StringRecord {
    fn cell_count(&self) -> usize {
        self.len()
    }

    fn cell(&self, index: usize) -> Option<&str> {
        self.get(index)
    }
}

impl<S: AsRef<str>> RowCells for [S] {
    fn cell_count(&self) -> usize {
        self.len()
    }

    fn cell(&self, index: usize) -> Option<&str> {
        self.get(index).map(AsRef::as_ref)
    }
}

impl<S: AsRef<str>> RowCells for Vec<S> {
    fn cell_count(&self) -> usize {
        self.len()
    }

    fn cell(&self, index: usize) -> Option<&str> {
        self.get(index).map(AsRef::as_ref)
    }
}

/// Why a data row was dropped from the totals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    InsufficientColumns,
    EmptyGroup,
    InvalidValue,
    /// Adding the value would overflow the group's running total.
    TotalOverflow,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::InsufficientColumns => "insufficient columns",
            SkipReason::EmptyGroup => "empty department",
            SkipReason::InvalidValue => "invalid sales value",
            SkipReason::TotalOverflow => "sales total overflow",
        };
        f.write_str(text)
    }
}

/// Row counters collected during one pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RollupStats {
    /// Data rows pulled from the source (the header is not counted).
    pub rows_read: u64,
    pub rows_aggregated: u64,
    pub insufficient_columns: u64,
    pub empty_group: u64,
    pub invalid_value: u64,
    pub total_overflow: u64,
}

impl RollupStats {
    pub fn rows_skipped(&self) -> u64 {
        self.insufficient_columns + self.empty_group + self.invalid_value + self.total_overflow
    }

    fn record_skip(&mut self, reason: SkipReason) {
        let counter = match reason {
            SkipReason::InsufficientColumns => &mut self.insufficient_columns,
            SkipReason::EmptyGroup => &mut self.empty_group,
            SkipReason::InvalidValue => &mut self.invalid_value,
            SkipReason::TotalOverflow => &mut self.total_overflow,
        };
        *counter += 1;
    }
}

/// Apply the per-row checks in order, returning the trimmed group key and parsed value.
fn classify_row<R>(row: &R, columns: ColumnIndices) -> Result<(&str, i64), SkipReason>
where
    R: RowCells + ?Sized,
{
    if row.cell_count() < columns.required_cells() {
        return Err(SkipReason::InsufficientColumns);
    }

    let group = row.cell(columns.group).unwrap_or("").trim();
    if group.is_empty() {
        return Err(SkipReason::EmptyGroup);
    }

    let value = row
        .cell(columns.value)
        .unwrap_or("")
        .trim()
        .parse::<i64>()
        .map_err(|_| SkipReason::InvalidValue)?;

    Ok((group, value))
}

fn accumulate(totals: &mut HashMap<String, i64>, group: &str, value: i64) -> Result<(), SkipReason> {
    match totals.get_mut(group) {
        Some(total) => {
            *total = total.checked_add(value).ok_or(SkipReason::TotalOverflow)?;
        }
        None => {
            totals.insert(group.to_owned(), value);
        }
    }
    Ok(())
}

/// Fold data rows into per-group totals in a single forward pass.
///
/// `rows` yields the rows *after* the header. A row that the source cannot produce aborts the
/// pass with [`AggregateError::UnreadableRow`]; rows that fail the data checks are skipped and
/// logged. A row whose value would overflow its department's `i64` total is skipped as well
/// ([`SkipReason::TotalOverflow`]), leaving the total as it was. Returns
/// [`AggregateError::EmptyResult`] when no row survives.
pub fn aggregate_rows<I, R, E>(rows: I, columns: ColumnIndices) -> Result<Rollup, AggregateError>
where
    I: IntoIterator<Item = Result<R, E>>,
    R: RowCells,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut totals: HashMap<String, i64> = HashMap::new();
    let mut stats = RollupStats::default();

    for row in rows {
        // Row 1 is the header.
        let row_number = stats.rows_read + 2;
        let row = row.map_err(|e| {
            let err = AggregateError::unreadable_row(row_number, e);
            log::error!("{err}");
            err
        })?;
        stats.rows_read += 1;

        let outcome = classify_row(&row, columns)
            .and_then(|(group, value)| accumulate(&mut totals, group, value));
        match outcome {
            Ok(()) => stats.rows_aggregated += 1,
            Err(reason) => {
                log::warn!("skipping row {row_number}: {reason}");
                stats.record_skip(reason);
            }
        }
    }

    if totals.is_empty() {
        return Err(AggregateError::EmptyResult);
    }

    let summaries: Vec<GroupSummary> = totals
        .into_iter()
        .map(|(group, total)| GroupSummary { group, total })
        .collect();
    log::info!(
        "processed {} departments from {} rows ({} skipped)",
        summaries.len(),
        stats.rows_read,
        stats.rows_skipped()
    );

    Ok(Rollup { summaries, stats })
}
