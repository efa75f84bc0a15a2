// ⚙️ Configuration - explicit values instead of global formatter state
// Every codec and file function takes these as parameters

use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Newest ledger schema this build reads and writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Preamble key carrying the schema version.
pub const SCHEMA_VERSION_KEY: &str = "#schema_version:";

// ============================================================================
// LEDGER FORMAT
// ============================================================================

/// Reserved markers used inside ledger fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerFormat {
    /// Joins list-typed attributes (keywords, colors, ...)
    pub value_separator: char,

    /// Joins per-face values; list values nest inside each face
    pub face_separator: char,

    /// Written for attributes the catalog did not provide at all
    pub null_marker: String,

    /// chrono format for backup file timestamps
    pub backup_timestamp_format: String,
}

impl LedgerFormat {
    pub fn new() -> Self {
        LedgerFormat {
            value_separator: '|',
            face_separator: '\u{2016}',
            null_marker: "\\N".to_string(),
            backup_timestamp_format: "%Y%m%d-%H%M%S".to_string(),
        }
    }

    /// Both reserved separators, for validation.
    pub fn reserved(&self) -> [char; 2] {
        [self.value_separator, self.face_separator]
    }
}

impl Default for LedgerFormat {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SAVE OPTIONS
// ============================================================================

/// Per-write switches for `save_ledger`.
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Copy the current file to a timestamped sibling before writing
    pub backup: bool,

    /// Insert the schema version marker when the preamble lacks one
    pub stamp_version: bool,

    /// Clock reading used for the backup name
    pub now: DateTime<Utc>,
}

impl SaveOptions {
    pub fn new(now: DateTime<Utc>) -> Self {
        SaveOptions {
            backup: true,
            stamp_version: true,
            now,
        }
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_stamp_version(mut self, stamp: bool) -> Self {
        self.stamp_version = stamp;
        self
    }
}

// ============================================================================
// INVENTORY CONFIG
// ============================================================================

/// Where the ledgers live and how the CLI treats them.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    /// Directory holding `collection.csv` and `decks/`
    pub root: PathBuf,

    /// Back up ledgers before rewriting them
    pub backup: bool,

    /// Local catalog mirror; `None` skips cache fetching
    pub catalog_dir: Option<PathBuf>,

    pub format: LedgerFormat,
}

impl InventoryConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        InventoryConfig {
            root: root.into(),
            backup: true,
            catalog_dir: None,
            format: LedgerFormat::default(),
        }
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_catalog_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.catalog_dir = dir;
        self
    }
}
