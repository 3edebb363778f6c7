use thiserror::Error;

/// Failures that abort an aggregation pass.
///
/// Per-row data problems are not represented here; see [`crate::SkipReason`].
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("failed to read CSV header: input was empty")]
    EmptyInput,
    #[error("department column not found in CSV header")]
    MissingGroupColumn,
    #[error("sales column not found in CSV header")]
    MissingValueColumn,
    #[error("failed to read CSV record at row {row}: {source}")]
    UnreadableRow {
        /// 1-based, counting the header as row 1.
        row: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("no valid data rows found in CSV file")]
    EmptyResult,
}

impl AggregateError {
    pub(crate) fn unreadable_row(
        row: u64,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AggregateError::UnreadableRow {
            row,
            source: source.into(),
        }
    }

    /// Row number attached to an [`AggregateError::UnreadableRow`].
    pub fn row(&self) -> Option<u64> {
        match self {
            AggregateError::UnreadableRow { row, .. } => Some(*row),
            _ => None,
        }
    }
}
