// Card Ledger - Core Library
// Collection and deck ledgers as plain text; exposes all modules for the CLI and tests

pub mod error;
pub mod config;
pub mod codec;          // Text Field Codec + record framing
pub mod values;         // Multi-Value Joiner
pub mod faces;          // Multi-Face Flattener
pub mod card;           // Card vocabulary (finish, rarity, formats...)
pub mod catalog;        // Catalog lookup + cached snapshot
pub mod row;            // Ledger row schema
pub mod consolidation;  // Consolidation Engine + Card Identity Equality
pub mod ledger;         // Ledger File Transaction
pub mod scan;           // Scanner import
pub mod inventory;      // Collection/deck workflows

// Re-export commonly used types
pub use error::{LedgerError, Result};
pub use config::{
    InventoryConfig, LedgerFormat, SaveOptions,
    CURRENT_SCHEMA_VERSION, SCHEMA_VERSION_KEY,
};
pub use codec::{
    escape, unescape, is_escaped, quote, encode_field, join_record, split_records, Record,
};
pub use values::{join_values, split_values, FieldValue, ListItem};
pub use faces::{flatten_faces, unflatten_faces, FaceValue};
pub use card::{Color, Condition, Finish, Format, Legalities, Legality, Rarity};
pub use catalog::{
    CardFace, CatalogCache, CatalogEntry, CatalogLookup, LocalCatalog, LookupError,
};
pub use row::{header_line, Column, ColumnMap, LedgerRow};
pub use consolidation::{
    consolidate, subtract, same_card, match_strategy, one_per_copy,
    Consolidation, Subtraction, MatchStrategy,
};
pub use ledger::{
    Ledger, load_ledger, save_ledger, parse_ledger, render_ledger, backup_path, is_backup_file,
};
pub use scan::{detect_source, get_parser, load_scan, ScanParser, ScanSource};
pub use inventory::{
    Inventory, Target, Progress, LogProgress,
    AddSummary, TransferSummary, MigrateSummary,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
