// ⚠️ Ledger Errors - every fatal condition of the core
// Recoverable conditions (fetch failures, removal misses) are logged, never raised

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for core ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that abort a whole ledger operation.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// File-system failure, tagged with the path involved.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Record framing could not be read.
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// A single row could not be decoded into a `LedgerRow`.
    #[error("malformed row at line {line}, column `{column}`: {reason}")]
    MalformedRow {
        line: usize,
        column: String,
        reason: String,
    },

    /// Header row is missing, has unknown columns, duplicates or gaps.
    #[error("invalid ledger header: {0}")]
    InvalidHeader(String),

    /// Preamble declares a schema this build does not understand.
    #[error("unsupported schema version {found} (newest known is {supported})")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },

    /// A value carries one of the reserved in-field separators.
    #[error("value {value:?} contains reserved separator {separator:?}")]
    ReservedSeparator { value: String, separator: char },

    /// `[""]` would read back as an empty list.
    #[error("a list holding a single empty value cannot be stored")]
    LoneEmptyValue,

    /// A per-face attribute disagrees with the card's face count.
    #[error("attribute `{attribute}` has {found} faces, expected {expected}")]
    FaceCountMismatch {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    /// A catalog entry cannot be turned into a cache snapshot.
    #[error("invalid catalog entry for {card}: {reason}")]
    InvalidCatalogEntry { card: String, reason: String },

    /// More than one existing row claims the same card identity.
    #[error("ledger integrity violation: {count} rows share the identity of {card}")]
    AmbiguousIdentity { card: String, count: usize },

    /// Summing quantities left the u32 range.
    #[error("quantity overflow while merging {card}")]
    QuantityOverflow { card: String },
}

impl LedgerError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LedgerError::Io {
            path: path.into(),
            source,
        }
    }
}
