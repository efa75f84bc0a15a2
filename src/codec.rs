// 🔤 Text Field Codec - RFC 4180 quoting for ledger fields
// escape/unescape are the idempotent field API; rows are written with `quote`
// and read back through the csv reader

use crate::error::{LedgerError, Result};

// ============================================================================
// FIELD ESCAPING
// ============================================================================

const QUOTE: char = '"';
const DELIMITER: char = ',';

/// Check whether `field` is already a well-formed quoted field:
/// wrapped in quotes, every inner quote doubled.
pub fn is_escaped(field: &str) -> bool {
    if field.len() < 2 || !field.starts_with(QUOTE) || !field.ends_with(QUOTE) {
        return false;
    }

    let inner = &field[1..field.len() - 1];
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == QUOTE && chars.next() != Some(QUOTE) {
            return false;
        }
    }
    true
}

/// Always wrap `raw` in quotes, doubling every inner quote.
///
/// This is the form rows are written in: `quote(x)` reads back as `x` for
/// every `x`, including values that already look quoted.
pub fn quote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push(QUOTE);
    for c in raw.chars() {
        if c == QUOTE {
            out.push(QUOTE);
        }
        out.push(c);
    }
    out.push(QUOTE);
    out
}

/// Wrap `raw` in quotes, doubling inner quotes.
///
/// A value that is already a well-formed quoted field is returned as-is, so
/// `escape(escape(x)) == escape(x)` for every `x`. Use `quote` when writing
/// stored values.
pub fn escape(raw: &str) -> String {
    if is_escaped(raw) {
        return raw.to_string();
    }
    quote(raw)
}

/// Strip the wrapping quotes of a well-formed quoted field and collapse
/// doubled quotes. Anything else is returned unchanged.
pub fn unescape(field: &str) -> String {
    if !is_escaped(field) {
        return field.to_string();
    }

    let inner = &field[1..field.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == QUOTE {
            // is_escaped guarantees the partner quote
            chars.next();
        }
        out.push(c);
    }
    out
}

/// True when a bare value would break record framing.
pub fn needs_quoting(value: &str) -> bool {
    value.starts_with(QUOTE)
        || value.contains(|c| c == DELIMITER || c == QUOTE || c == '\n' || c == '\r')
}

/// Encode one field: quoted when asked to or when framing requires it.
pub fn encode_field(value: &str, always_quote: bool) -> String {
    if always_quote || needs_quoting(value) {
        quote(value)
    } else {
        value.to_string()
    }
}

// ============================================================================
// RECORD FRAMING
// ============================================================================

/// One decoded record: its starting line and unescaped field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Join already-encoded fields into one record line (no terminator).
pub fn join_record<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| f.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}

/// Split ledger body text into records.
///
/// Quoted fields may span lines. Blank lines between records are skipped.
/// `first_line` is the 1-based line number of `text`'s first line, used for
/// error reporting.
pub fn split_records(text: &str, first_line: usize) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut lines = LineCounter::new(text, first_line);
    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| LedgerError::MalformedRecord {
            line: e.position().map_or(first_line, |p| lines.at(p.byte() as usize)),
            reason: e.to_string(),
        })?;

        let line = record
            .position()
            .map_or(first_line, |p| lines.at(p.byte() as usize));
        records.push(Record {
            line,
            fields: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(records)
}

/// Maps byte offsets to line numbers. Offsets must be non-decreasing.
struct LineCounter<'a> {
    text: &'a str,
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(text: &'a str, first_line: usize) -> Self {
        LineCounter {
            text,
            offset: 0,
            line: first_line,
        }
    }

    /// Line of the first non-blank character at or after `offset`. The
    /// reader reports a record's position before the blank lines it skips.
    fn at(&mut self, offset: usize) -> usize {
        let rest = self.text.get(offset..).unwrap_or("");
        let start = offset + (rest.len() - rest.trim_start_matches(['\r', '\n']).len());
        if start > self.offset {
            let span = self.text.get(self.offset..start).unwrap_or("");
            self.line += span.matches('\n').count();
            self.offset = start;
        }
        self.line
    }
}

// ============================================================================
// TESTS
// ============================================================================
