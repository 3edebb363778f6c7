use std::io::{self, Read};

use thiserror::Error;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Quoting rule broken by a record.
///
/// The `csv` tokenizer accepts these leniently; the rollup rejects them so that a stray quote
/// cannot silently merge or reshape rows.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum QuoteError {
    #[error("bare quote in unquoted field")]
    BareQuote,
    #[error("unexpected text after closing quote")]
    TextAfterQuote,
    #[error("quoted field is never closed")]
    UnclosedQuote,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    RecordStart,
    FieldStart,
    Unquoted,
    Quoted,
    /// A `"` inside a quoted field: either an escaped quote or the closing one.
    QuoteInQuoted,
}

/// Pass-through reader that checks RFC 4180 quoting on every byte handed to the tokenizer.
///
/// Records are counted the way `csv` counts them: `\r`, `\n` and `\r\n` end a record, blank
/// lines are not records, and terminators inside quotes do not count. Only the first violation
/// is kept.
pub(crate) struct QuoteCheck<R> {
    inner: R,
    state: State,
    /// Leading byte-order-mark bytes matched so far; `None` once past the start of the stream.
    bom_matched: Option<usize>,
    record: u64,
    violation: Option<(u64, QuoteError)>,
}

impl<R> QuoteCheck<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            state: State::RecordStart,
            bom_matched: Some(0),
            record: 0,
            violation: None,
        }
    }

    /// The first violation, if it lies on or before `row` (1-based, header is row 1).
    ///
    /// The tokenizer reads ahead, so violations further down the stream stay hidden until the
    /// caller reaches them.
    pub(crate) fn violation_at(&self, row: u64) -> Option<QuoteError> {
        self.violation
            .filter(|(at, _)| *at <= row)
            .map(|(_, err)| err)
    }

    fn scan(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if self.violation.is_some() {
                return;
            }
            if let Some(matched) = self.bom_matched {
                if byte == UTF8_BOM[matched] {
                    self.bom_matched = (matched + 1 < UTF8_BOM.len()).then_some(matched + 1);
                    continue;
                }
                self.bom_matched = None;
                if matched > 0 {
                    self.step(UTF8_BOM[0]);
                }
            }
            self.step(byte);
        }
    }

    fn step(&mut self, byte: u8) {
        let ends_record = byte == b'\n' || byte == b'\r';
        self.state = match self.state {
            State::RecordStart if ends_record => State::RecordStart,
            State::RecordStart => {
                self.record += 1;
                field_start(byte)
            }
            State::FieldStart => field_start(byte),
            State::Unquoted => match byte {
                b'"' => return self.reject(QuoteError::BareQuote),
                b',' => State::FieldStart,
                _ if ends_record => State::RecordStart,
                _ => State::Unquoted,
            },
            State::Quoted => match byte {
                b'"' => State::QuoteInQuoted,
                _ => State::Quoted,
            },
            State::QuoteInQuoted => match byte {
                b'"' => State::Quoted,
                b',' => State::FieldStart,
                _ if ends_record => State::RecordStart,
                _ => return self.reject(QuoteError::TextAfterQuote),
            },
        };
    }

    fn finish(&mut self) {
        if self.violation.is_none() && self.state == State::Quoted {
            self.reject(QuoteError::UnclosedQuote);
        }
    }

    fn reject(&mut self, err: QuoteError) {
        self.violation = Some((self.record, err));
    }
}

fn field_start(byte: u8) -> State {
    match byte {
        b'"' => State::Quoted,
        b',' => State::FieldStart,
        b'\n' | b'\r' => State::RecordStart,
        _ => State::Unquoted,
    }
}

impl<R: Read> Read for QuoteCheck<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            if !buf.is_empty() {
                self.finish();
            }
        } else {
            self.scan(&buf[..n]);
        }
        Ok(n)
    }
}
