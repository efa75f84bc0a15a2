// 📦 Inventory - collection and deck ledgers on disk
// Layout: <root>/collection.csv and <root>/decks/<deck>.csv
// Every workflow is load → consolidate/subtract → save; files are only
// written after all new row sets have been computed and rendered.

use crate::catalog::{CatalogCache, CatalogLookup, LookupError};
use crate::config::{InventoryConfig, SaveOptions};
use crate::consolidation::{consolidate, one_per_copy, same_card, subtract, total_quantity};
use crate::ledger::{is_backup_file, load_ledger, render_ledger, save_ledger, Ledger};
use crate::row::LedgerRow;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const COLLECTION_FILE: &str = "collection.csv";
pub const DECK_DIR: &str = "decks";
pub const LEDGER_EXTENSION: &str = "csv";

// ============================================================================
// TYPES
// ============================================================================

/// Which ledger a workflow writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Collection,
    Deck(String),
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Collection => write!(f, "collection"),
            Target::Deck(name) => write!(f, "deck '{}'", name),
        }
    }
}

/// Progress sink for per-card work (catalog fetches).
pub trait Progress {
    fn advance(&mut self, done: usize, total: usize);
}

impl Progress for () {
    fn advance(&mut self, _done: usize, _total: usize) {}
}

/// Emits a debug event per step.
pub struct LogProgress;

impl Progress for LogProgress {
    fn advance(&mut self, done: usize, total: usize) {
        debug!(done, total, "catalog fetch progress");
    }
}

#[derive(Debug, Clone)]
pub struct AddSummary {
    pub path: PathBuf,
    pub merged: usize,
    pub appended: usize,
    pub copies_added: u64,

    /// Copies held by the target after the add
    pub total_copies: u64,
    pub fetched: usize,
    pub fetch_failed: usize,
    pub created: bool,
    pub backup: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct TransferSummary {
    pub from: PathBuf,
    pub to: PathBuf,
    pub moved: u64,

    /// Scanned cards the source did not hold
    pub missing: Vec<LedgerRow>,
    pub backups: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct MigrateSummary {
    pub path: PathBuf,
    pub backfilled: usize,
    pub still_uncached: usize,

    /// The file carried no version line before
    pub stamped: bool,
    pub backup: Option<PathBuf>,
}

// ============================================================================
// INVENTORY
// ============================================================================

pub struct Inventory {
    config: InventoryConfig,
}

impl Inventory {
    pub fn new(config: InventoryConfig) -> Self {
        Inventory { config }
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    pub fn collection_path(&self) -> PathBuf {
        self.config.root.join(COLLECTION_FILE)
    }

    pub fn deck_dir(&self) -> PathBuf {
        self.config.root.join(DECK_DIR)
    }

    pub fn deck_path(&self, name: &str) -> Result<PathBuf> {
        if !is_plain_stem(name) {
            bail!("Invalid deck name {:?}: must be a plain file name without extension", name);
        }
        Ok(self.deck_dir().join(format!("{}.{}", name, LEDGER_EXTENSION)))
    }

    pub fn target_path(&self, target: &Target) -> Result<PathBuf> {
        match target {
            Target::Collection => Ok(self.collection_path()),
            Target::Deck(name) => self.deck_path(name),
        }
    }

    fn save_options(&self, now: DateTime<Utc>) -> SaveOptions {
        SaveOptions::new(now).with_backup(self.config.backup)
    }

    fn load(&self, path: &Path) -> Result<Ledger> {
        load_ledger(path, &self.config.format)
            .with_context(|| format!("Failed to load ledger {}", path.display()))
    }

    fn save(&self, path: &Path, ledger: &Ledger, now: DateTime<Utc>) -> Result<Option<PathBuf>> {
        save_ledger(path, ledger, &self.save_options(now), &self.config.format)
            .with_context(|| format!("Failed to save ledger {}", path.display()))
    }

    // ------------------------------------------------------------------------
    // Decks
    // ------------------------------------------------------------------------

    /// Deck names, sorted. Junk entries in the deck directory are skipped.
    pub fn list_decks(&self) -> Result<Vec<String>> {
        let dir = self.deck_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut decks = Vec::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("Failed to list {}", dir.display()))? {
            let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if let Some(deck) = deck_name_from_file(name) {
                decks.push(deck.to_string());
            } else {
                debug!(entry = name, "skipping non-deck entry");
            }
        }

        decks.sort();
        Ok(decks)
    }

    /// Write an empty, version-stamped deck ledger.
    pub fn create_deck(&self, name: &str, now: DateTime<Utc>) -> Result<PathBuf> {
        let path = self.deck_path(name)?;
        if path.exists() {
            bail!("Deck '{}' already exists at {}", name, path.display());
        }

        let dir = self.deck_dir();
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

        let options = SaveOptions::new(now).with_backup(false);
        save_ledger(&path, &Ledger::new(), &options, &self.config.format)
            .with_context(|| format!("Failed to create deck {}", path.display()))?;

        info!(deck = name, "created deck");
        Ok(path)
    }

    // ------------------------------------------------------------------------
    // Workflows
    // ------------------------------------------------------------------------

    /// Consolidate scanned cards into the target ledger.
    ///
    /// The collection is created when missing; a missing deck is an error.
    /// With a catalog, cards whose printing is not already cached in the
    /// target get a fetched cache; fetch failures only leave them uncached.
    pub fn add(
        &self,
        scan: Vec<LedgerRow>,
        target: &Target,
        catalog: Option<&dyn CatalogLookup>,
        progress: &mut dyn Progress,
        now: DateTime<Utc>,
    ) -> Result<AddSummary> {
        let path = self.target_path(target)?;
        let created = !path.exists();
        let ledger = match target {
            Target::Collection if created => {
                info!(path = %path.display(), "collection not found; starting a new one");
                ensure_root(&self.config)?;
                Ledger::new()
            }
            Target::Deck(name) if created => {
                bail!("Deck '{}' does not exist (create it with new-deck)", name);
            }
            _ => self.load(&path)?,
        };

        let mut scan = scan;
        let mut fetched = 0;
        let mut fetch_failed = 0;
        if let Some(catalog) = catalog {
            let total = scan.len();
            for (i, card) in scan.iter_mut().enumerate() {
                let known = ledger
                    .rows
                    .iter()
                    .any(|row| row.has_cache() && same_card(row, card));
                if card.cache.is_none() && !known {
                    match self.fetch_cache(catalog, card, now) {
                        Some(cache) => {
                            card.cache = Some(cache);
                            fetched += 1;
                        }
                        None => fetch_failed += 1,
                    }
                }
                progress.advance(i + 1, total);
            }
        }

        let copies_added = total_quantity(&scan);
        let Ledger { preamble, rows } = ledger;
        let result = consolidate(rows, scan)
            .with_context(|| format!("Failed to consolidate into {}", target))?;

        let updated = Ledger {
            preamble,
            rows: result.rows,
        };
        let backup = self.save(&path, &updated, now)?;
        let total_copies = updated.total_quantity();

        info!(
            target = %target,
            merged = result.merged,
            appended = result.appended,
            "added scanned cards"
        );

        Ok(AddSummary {
            path,
            merged: result.merged,
            appended: result.appended,
            copies_added,
            total_copies,
            fetched,
            fetch_failed,
            created,
            backup,
        })
    }

    /// Pull scanned copies out of the collection into a deck.
    pub fn move_to_deck(&self, deck: &str, scan: Vec<LedgerRow>, now: DateTime<Utc>) -> Result<TransferSummary> {
        let deck_path = self.deck_path(deck)?;
        if !deck_path.exists() {
            bail!("Deck '{}' does not exist (create it with new-deck)", deck);
        }
        let collection = self.collection_path();
        if !collection.exists() {
            bail!("No collection at {}", collection.display());
        }
        self.transfer(&collection, &deck_path, scan, now)
    }

    /// Put scanned copies from a deck back into the collection.
    pub fn return_from_deck(&self, deck: &str, scan: Vec<LedgerRow>, now: DateTime<Utc>) -> Result<TransferSummary> {
        let deck_path = self.deck_path(deck)?;
        if !deck_path.exists() {
            bail!("Deck '{}' does not exist", deck);
        }
        self.transfer(&deck_path, &self.collection_path(), scan, now)
    }

    /// One unit per scanned copy leaves `from`; exactly those units, with the
    /// source rows' caches, are consolidated into `to`.
    fn transfer(&self, from: &Path, to: &Path, scan: Vec<LedgerRow>, now: DateTime<Utc>) -> Result<TransferSummary> {
        let format = &self.config.format;
        let source = self.load(from)?;
        let dest = if to.exists() { self.load(to)? } else { Ledger::new() };

        let Ledger { preamble, rows } = source;
        let pulled = subtract(rows, one_per_copy(scan))
            .with_context(|| format!("Failed to remove cards from {}", from.display()))?;
        let moved = total_quantity(&pulled.removed);
        let source = Ledger {
            preamble,
            rows: pulled.rows,
        };

        let Ledger { preamble, rows } = dest;
        let merged = consolidate(rows, pulled.removed)
            .with_context(|| format!("Failed to add cards to {}", to.display()))?;
        let dest = Ledger {
            preamble,
            rows: merged.rows,
        };

        // Both files must encode before either is touched.
        render_ledger(&source, true, format)
            .with_context(|| format!("Cannot encode {}", from.display()))?;
        render_ledger(&dest, true, format)
            .with_context(|| format!("Cannot encode {}", to.display()))?;

        // Destination first: a failure in between duplicates cards rather
        // than losing them.
        let mut backups = Vec::new();
        backups.extend(self.save(to, &dest, now)?);
        backups.extend(self.save(from, &source, now)?);

        if !pulled.missing.is_empty() {
            warn!(count = pulled.missing.len(), from = %from.display(), "scanned cards not found in source");
        }
        info!(moved, from = %from.display(), to = %to.display(), "transferred cards");

        Ok(TransferSummary {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            moved,
            missing: pulled.missing,
            backups,
        })
    }

    /// Backfill caches for uncached rows and stamp the schema version.
    pub fn migrate(
        &self,
        target: &Target,
        catalog: &dyn CatalogLookup,
        progress: &mut dyn Progress,
        now: DateTime<Utc>,
    ) -> Result<MigrateSummary> {
        let path = self.target_path(target)?;
        if !path.exists() {
            bail!("Nothing to migrate: {} does not exist", path.display());
        }
        let mut ledger = self.load(&path)?;

        let total = ledger.rows.len();
        let mut backfilled = 0;
        let mut still_uncached = 0;
        for i in 0..total {
            if ledger.rows[i].cache.is_none() {
                match self.fetch_cache(catalog, &ledger.rows[i], now) {
                    Some(cache) => {
                        ledger.rows[i].cache = Some(cache);
                        backfilled += 1;
                    }
                    None => still_uncached += 1,
                }
            }
            progress.advance(i + 1, total);
        }

        let stamped = ledger
            .stamp_version()
            .with_context(|| format!("Failed to stamp {}", path.display()))?;
        let backup = self.save(&path, &ledger, now)?;

        info!(path = %path.display(), backfilled, still_uncached, "migrated ledger");
        Ok(MigrateSummary {
            path,
            backfilled,
            still_uncached,
            stamped,
            backup,
        })
    }

    /// Fetch and flatten a cache for `card`. Every failure is logged and
    /// yields `None`, including caches whose text cannot be stored.
    fn fetch_cache(
        &self,
        catalog: &dyn CatalogLookup,
        card: &LedgerRow,
        now: DateTime<Utc>,
    ) -> Option<CatalogCache> {
        let entry = match catalog.fetch(Some(&card.name), &card.set_code, &card.collector_number) {
            Ok(entry) => entry,
            Err(LookupError::NotFound(what)) => {
                warn!(card = %card, "not in catalog: {}", what);
                return None;
            }
            Err(err @ LookupError::Transient(_)) => {
                warn!(card = %card, error = %err, "catalog fetch failed");
                return None;
            }
        };

        let cache = match CatalogCache::from_entry(&entry, now) {
            Ok(cache) => cache,
            Err(err) => {
                warn!(card = %card, error = %err, "unusable catalog entry");
                return None;
            }
        };

        let candidate = card.clone().with_cache(cache);
        match candidate.encode(&self.config.format) {
            Ok(_) => candidate.cache,
            Err(err) => {
                warn!(card = %card, error = %err, "catalog data cannot be stored; keeping row uncached");
                None
            }
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Non-empty, no path or shell-hostile characters, not hidden.
fn is_plain_stem(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && !name.starts_with('.')
        && !name.contains(crate::ledger::BACKUP_MARKER)
        && !name
            .chars()
            .any(|c| c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
}

/// Deck name for a directory entry, or `None` for junk.
fn deck_name_from_file(file_name: &str) -> Option<&str> {
    if file_name.starts_with('.') || is_backup_file(file_name) {
        return None;
    }
    let stem = file_name.strip_suffix(&format!(".{}", LEDGER_EXTENSION))?;
    is_plain_stem(stem).then_some(stem)
}

/// Parse a `Target` from an optional deck name.
pub fn target_for(deck: Option<&str>) -> Target {
    match deck {
        Some(name) => Target::Deck(name.to_string()),
        None => Target::Collection,
    }
}

/// Ensure the root directory exists.
pub fn ensure_root(config: &InventoryConfig) -> Result<()> {
    fs::create_dir_all(&config.root)
        .with_context(|| format!("Failed to create inventory root {}", config.root.display()))
}

// ============================================================================
// TESTS
// ============================================================================
