//! `rollup-model` is the aggregation core of the sales rollup service.
//!
//! Given a CSV stream whose first row is a header, it:
//! - locates the department (group) and sales (value) columns by synonym
//! - folds the data rows into per-department totals in a single forward pass
//! - skips malformed rows with a warning instead of failing the whole import
//!
//! The crate never touches the file system; callers hand it any [`std::io::Read`] and
//! receive the summaries in memory. [`write_summary_csv`] renders them in the download format.

mod aggregate;
mod columns;
mod error;
pub mod import;
mod quoting;
mod summary;

pub use aggregate::{aggregate_rows, RollupStats, RowCells, SkipReason};
pub use columns::{
    resolve_columns, ColumnIndices, GROUP_COLUMN_SYNONYMS, VALUE_COLUMN_SYNONYMS,
};
pub use error::AggregateError;
pub use import::aggregate_csv;
pub use quoting::QuoteError;
pub use summary::{write_summary_csv, GroupSummary, Rollup, RESULT_CSV_HEADER};
