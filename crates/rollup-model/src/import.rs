use std::io::Read;

use csv::{StringRecord, StringRecordsIntoIter};

use crate::quoting::QuoteCheck;
use crate::{aggregate_rows, resolve_columns, AggregateError, Rollup};

const UTF8_BOM: char = '\u{feff}';

/// Aggregate a CSV stream whose first row is the header.
///
/// Records are pulled one at a time; the input is never buffered in full. Rows may have
/// varying cell counts. Quoting is strict: a bare quote in an unquoted field, text after a
/// closing quote, or a quote that is never closed aborts the pass with
/// [`AggregateError::UnreadableRow`]. The reader is dropped before this returns, on success or
/// failure.
pub fn aggregate_csv<R: Read>(reader: R) -> Result<Rollup, AggregateError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        // The header goes through column resolution rather than csv's own header handling.
        .has_headers(false)
        // Short rows are skipped by the aggregator, not rejected by the tokenizer.
        .flexible(true)
        .from_reader(QuoteCheck::new(reader));

    let mut header = StringRecord::new();
    match csv_reader.read_record(&mut header) {
        Ok(true) => {}
        Ok(false) => return Err(AggregateError::EmptyInput),
        Err(e) => {
            log::error!("failed to read CSV header: {e}");
            return Err(AggregateError::unreadable_row(1, e));
        }
    }
    if let Some(err) = csv_reader.get_ref().violation_at(1) {
        log::error!("failed to read CSV header: {err}");
        return Err(AggregateError::unreadable_row(1, err));
    }

    let columns = resolve_columns(
        header
            .iter()
            .enumerate()
            // Excel-exported CSVs commonly start with a byte-order mark.
            .map(|(idx, cell)| if idx == 0 { cell.trim_start_matches(UTF8_BOM) } else { cell }),
    )?;

    aggregate_rows(CheckedRecords::new(csv_reader.into_records()), columns)
}

/// Data records that surface a quoting violation in place of the record it occurs on.
struct CheckedRecords<R> {
    records: StringRecordsIntoIter<QuoteCheck<R>>,
    /// Row of the last record yielded; the header is row 1.
    row: u64,
    done: bool,
}

impl<R> CheckedRecords<R> {
    fn new(records: StringRecordsIntoIter<QuoteCheck<R>>) -> Self {
        Self {
            records,
            row: 1,
            done: false,
        }
    }
}

impl<R: Read> Iterator for CheckedRecords<R> {
    type Item = Result<StringRecord, Box<dyn std::error::Error + Send + Sync>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some(record) = self.records.next() else {
            self.done = true;
            // A violation on a record the tokenizer never emitted.
            let err = self.records.reader().get_ref().violation_at(u64::MAX)?;
            return Some(Err(err.into()));
        };
        self.row += 1;
        if let Some(err) = self.records.reader().get_ref().violation_at(self.row) {
            self.done = true;
            return Some(Err(err.into()));
        }
        Some(record.map_err(Into::into))
    }
}
