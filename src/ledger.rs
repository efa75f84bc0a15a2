// 🗂️ Ledger File Transaction - load, rewrite, back up
// The whole new file is rendered in memory before the disk is touched;
// the write goes to a temp sibling and is renamed into place.

use crate::codec::split_records;
use crate::config::{LedgerFormat, SaveOptions, CURRENT_SCHEMA_VERSION, SCHEMA_VERSION_KEY};
use crate::error::{LedgerError, Result};
use crate::row::{header_line, ColumnMap, LedgerRow};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Marker inside backup file names.
pub const BACKUP_MARKER: &str = ".backup.";

// ============================================================================
// LEDGER
// ============================================================================

/// Preamble lines plus rows, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    /// Metadata lines before the header, kept verbatim
    pub preamble: Vec<String>,
    pub rows: Vec<LedgerRow>,
}

impl Ledger {
    /// Empty ledger stamped with the current schema version.
    pub fn new() -> Self {
        Ledger {
            preamble: vec![version_line(CURRENT_SCHEMA_VERSION)],
            rows: Vec::new(),
        }
    }

    /// Version declared in the preamble, if any.
    pub fn schema_version(&self) -> Result<Option<u32>> {
        for (i, line) in self.preamble.iter().enumerate() {
            if let Some(value) = line.strip_prefix(SCHEMA_VERSION_KEY) {
                let version = value.trim().parse::<u32>().map_err(|_| {
                    LedgerError::MalformedRecord {
                        line: i + 1,
                        reason: format!("bad schema version {:?}", value.trim()),
                    }
                })?;
                return Ok(Some(version));
            }
        }
        Ok(None)
    }

    /// Insert the version marker when absent. Returns whether it was added.
    pub fn stamp_version(&mut self) -> Result<bool> {
        if self.schema_version()?.is_some() {
            return Ok(false);
        }
        self.preamble.insert(0, version_line(CURRENT_SCHEMA_VERSION));
        Ok(true)
    }

    pub fn total_quantity(&self) -> u64 {
        crate::consolidation::total_quantity(&self.rows)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

fn version_line(version: u32) -> String {
    format!("{} {}", SCHEMA_VERSION_KEY, version)
}

// ============================================================================
// PARSE / RENDER
// ============================================================================

/// Parse ledger text. Any malformed row fails the whole ledger.
pub fn parse_ledger(text: &str, format: &LedgerFormat) -> Result<Ledger> {
    let mut preamble = Vec::new();
    let mut offset = 0;
    let mut header = None;

    for (i, raw) in text.split_inclusive('\n').enumerate() {
        let line = raw.trim_end_matches(['\n', '\r']);
        offset += raw.len();
        if line.trim().is_empty() || line.starts_with('#') {
            preamble.push(line.to_string());
            continue;
        }
        header = Some((i + 1, line));
        break;
    }

    let (header_no, header_text) =
        header.ok_or_else(|| LedgerError::InvalidHeader("missing header row".to_string()))?;

    // blank lines between preamble and header carry no metadata
    while preamble.last().is_some_and(|l| l.trim().is_empty()) {
        preamble.pop();
    }

    let ledger_preamble = Ledger {
        preamble,
        rows: Vec::new(),
    };
    if let Some(found) = ledger_preamble.schema_version()? {
        if found > CURRENT_SCHEMA_VERSION {
            return Err(LedgerError::UnsupportedSchemaVersion {
                found,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }
    }

    let header_record = split_records(header_text, header_no)?;
    let header_fields = header_record
        .first()
        .map(|r| r.fields.as_slice())
        .unwrap_or_default();
    let columns = ColumnMap::from_header(header_fields)?;

    let records = split_records(&text[offset..], header_no + 1)?;
    let rows = records
        .iter()
        .map(|record| LedgerRow::decode(record, &columns, format))
        .collect::<Result<Vec<_>>>()?;

    Ok(Ledger {
        preamble: ledger_preamble.preamble,
        rows,
    })
}

/// Stable, case-insensitive name order.
pub fn sort_rows(rows: &mut [LedgerRow]) {
    rows.sort_by_cached_key(|row| row.sort_key());
}

/// Render the full file text: preamble, canonical header, sorted rows.
pub fn render_ledger(ledger: &Ledger, stamp_version: bool, format: &LedgerFormat) -> Result<String> {
    let mut ledger = ledger.clone();
    if stamp_version {
        ledger.stamp_version()?;
    }
    sort_rows(&mut ledger.rows);

    let mut out = String::new();
    for line in &ledger.preamble {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&header_line());
    out.push('\n');
    for row in &ledger.rows {
        out.push_str(&row.encode(format)?);
        out.push('\n');
    }
    Ok(out)
}

// ============================================================================
// FILE TRANSACTION
// ============================================================================

/// Read and parse a ledger file.
pub fn load_ledger(path: &Path, format: &LedgerFormat) -> Result<Ledger> {
    let text = fs::read_to_string(path).map_err(|e| LedgerError::io(path, e))?;
    let ledger = parse_ledger(&text, format)?;
    debug!(path = %path.display(), rows = ledger.rows.len(), "loaded ledger");
    Ok(ledger)
}

/// Timestamped sibling used for backups:
/// `collection.csv` → `collection.20261019-153000.backup.csv`.
pub fn backup_path(path: &Path, now: DateTime<Utc>, format: &LedgerFormat) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("ledger");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("csv");
    let stamp = now.format(&format.backup_timestamp_format).to_string();

    let mut candidate = path.with_file_name(format!("{}.{}{}{}", stem, stamp, BACKUP_MARKER, ext));
    let mut n = 1;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{}.{}-{}{}{}", stem, stamp, n, BACKUP_MARKER, ext));
        n += 1;
    }
    candidate
}

pub fn is_backup_file(name: &str) -> bool {
    name.contains(BACKUP_MARKER)
}

/// Write `ledger` to `path`.
///
/// Rendering happens first, so an encoding error leaves the file untouched.
/// With `backup`, the current file is copied before the write; a failed copy
/// aborts the save. Returns the backup path when one was made.
pub fn save_ledger(
    path: &Path,
    ledger: &Ledger,
    options: &SaveOptions,
    format: &LedgerFormat,
) -> Result<Option<PathBuf>> {
    let text = render_ledger(ledger, options.stamp_version, format)?;

    let backup = if options.backup && path.exists() {
        let target = backup_path(path, options.now, format);
        fs::copy(path, &target).map_err(|e| LedgerError::io(&target, e))?;
        info!(backup = %target.display(), "backed up ledger");
        Some(target)
    } else {
        None
    };

    write_atomic(path, text.as_bytes())?;
    info!(path = %path.display(), rows = ledger.rows.len(), "saved ledger");
    Ok(backup)
}

/// Temp sibling + fsync + rename: readers see the old or the new file, never
/// a truncated one. An existing file's permissions carry over.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| LedgerError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| LedgerError::io(tmp.path(), e))?;

    // temp files are created owner-only; a rewrite keeps the ledger's mode
    if let Ok(existing) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(|e| LedgerError::io(tmp.path(), e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| LedgerError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| LedgerError::io(path, e.error))?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{delver_json, fetched_at, sol_ring_json};
    use crate::catalog::{CatalogCache, CatalogEntry};
    use crate::consolidation::{consolidate, subtract};
    use crate::faces::FaceValue;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn create_test_options() -> SaveOptions {
        SaveOptions::new(Utc.with_ymd_and_hms(2026, 10, 19, 15, 30, 0).unwrap())
    }

    fn create_test_cache(json: serde_json::Value) -> CatalogCache {
        let entry: CatalogEntry = serde_json::from_value(json).unwrap();
        CatalogCache::from_entry(&entry, fetched_at()).unwrap()
    }

    fn create_test_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.rows = vec![
            LedgerRow::new("sol Ring", "c21", "263").with_quantity(2).with_cache(create_test_cache(sol_ring_json())),
            LedgerRow::new("Arcane Signet", "c21", "234"),
            LedgerRow::new("Delver of Secrets // Insectile Aberration", "isd", "51")
                .with_cache(create_test_cache(delver_json())),
            LedgerRow::new("Sol Ring", "cmr", "472"),
        ];
        ledger
    }

    fn write_ledger(dir: &TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("collection.csv");
        let format = LedgerFormat::default();
        let ledger = create_test_ledger();

        save_ledger(&path, &ledger, &create_test_options(), &format).unwrap();
        let loaded = load_ledger(&path, &format).unwrap();

        let mut expected = ledger.rows.clone();
        sort_rows(&mut expected);
        assert_eq!(loaded.rows, expected);
        assert_eq!(loaded.preamble, ledger.preamble);

        // second pass is byte-stable
        let first = fs::read_to_string(&path).unwrap();
        save_ledger(&path, &loaded, &create_test_options().with_backup(false), &format).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_rows_sorted_case_insensitive_and_stable() {
        let format = LedgerFormat::default();
        let text = render_ledger(&create_test_ledger(), true, &format).unwrap();
        let names: Vec<&str> = text
            .lines()
            .skip(2)
            .map(|l| l.split(',').nth(1).unwrap())
            .collect();

        assert_eq!(
            names,
            vec![
                "\"Arcane Signet\"",
                "\"Delver of Secrets // Insectile Aberration\"",
                "\"sol Ring\"",
                "\"Sol Ring\"",
            ]
        );
    }

    #[test]
    fn test_reader_accepts_any_row_order() {
        let format = LedgerFormat::default();
        let a = LedgerRow::new("Zombie", "m21", "1").encode(&format).unwrap();
        let b = LedgerRow::new("Angel", "m21", "2").encode(&format).unwrap();
        let text = format!("#schema_version: 1\n{}\n{}\n{}\n", header_line(), a, b);

        let ledger = parse_ledger(&text, &format).unwrap();
        assert_eq!(ledger.rows[0].name, "Zombie");
        assert_eq!(ledger.rows[1].name, "Angel");
    }

    #[test]
    fn test_backup_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let format = LedgerFormat::default();
        let original = format!("#schema_version: 1\n# owner: me\n{}\n", header_line());
        let path = write_ledger(&dir, "collection.csv", &original);

        let ledger = create_test_ledger();
        let backup = save_ledger(&path, &ledger, &create_test_options(), &format)
            .unwrap()
            .unwrap();

        assert_eq!(
            backup.file_name().unwrap().to_str().unwrap(),
            "collection.20261019-153000.backup.csv"
        );
        assert_eq!(fs::read_to_string(&backup).unwrap(), original);
        assert_ne!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_backup_names_never_collide() {
        let dir = TempDir::new().unwrap();
        let format = LedgerFormat::default();
        let path = write_ledger(&dir, "deck.csv", &format!("{}\n", header_line()));
        let options = create_test_options();

        let first = save_ledger(&path, &Ledger::new(), &options, &format).unwrap().unwrap();
        let second = save_ledger(&path, &Ledger::new(), &options, &format).unwrap().unwrap();
        assert_ne!(first, second);
        assert!(is_backup_file(second.file_name().unwrap().to_str().unwrap()));
    }

    #[test]
    fn test_no_backup_for_new_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new.csv");
        let backup = save_ledger(&path, &Ledger::new(), &create_test_options(), &LedgerFormat::default()).unwrap();
        assert!(backup.is_none());
        assert!(path.exists());
    }

    #[test]
    fn test_version_stamped_when_missing() {
        let format = LedgerFormat::default();
        let text = format!("# my notes\n{}\n", header_line());
        let ledger = parse_ledger(&text, &format).unwrap();
        assert_eq!(ledger.schema_version().unwrap(), None);

        let stamped = render_ledger(&ledger, true, &format).unwrap();
        assert!(stamped.starts_with("#schema_version: 1\n# my notes\n"));

        let unstamped = render_ledger(&ledger, false, &format).unwrap();
        assert!(unstamped.starts_with("# my notes\n"));
    }

    #[test]
    fn test_newer_schema_rejected() {
        let text = format!("#schema_version: 7\n{}\n", header_line());
        let err = parse_ledger(&text, &LedgerFormat::default()).unwrap_err();
        assert!(matches!(err, LedgerError::UnsupportedSchemaVersion { found: 7, .. }));
    }

    #[test]
    fn test_missing_header_rejected() {
        let err = parse_ledger("#schema_version: 1\n\n", &LedgerFormat::default()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidHeader(_)));
    }

    #[test]
    fn test_malformed_row_fails_whole_load() {
        let format = LedgerFormat::default();
        let good = LedgerRow::new("Sol Ring", "c21", "263").encode(&format).unwrap();
        let bad = good.replacen("1,", "x,", 1);
        let text = format!("#schema_version: 1\n{}\n{}\n{}\n", header_line(), good, bad);

        let err = parse_ledger(&text, &format).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRow { line: 4, .. }));
    }

    #[test]
    fn test_failed_encode_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let format = LedgerFormat::default();
        let original = format!("#schema_version: 1\n{}\n", header_line());
        let path = write_ledger(&dir, "collection.csv", &original);

        let mut ledger = Ledger::new();
        let mut cache = create_test_cache(sol_ring_json());
        cache.keywords = vec!["bad|keyword".to_string()];
        ledger.rows.push(LedgerRow::new("Sol Ring", "c21", "263").with_cache(cache));

        let err = save_ledger(&path, &ledger, &create_test_options(), &format).unwrap_err();
        assert!(matches!(err, LedgerError::ReservedSeparator { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);

        // no backup was taken either
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_sol_ring_scenario() {
        let dir = TempDir::new().unwrap();
        let format = LedgerFormat::default();
        let row = LedgerRow::new("Sol Ring", "c21", "263").encode(&format).unwrap();
        assert!(row.starts_with("1,\"Sol Ring\","));
        let path = write_ledger(
            &dir,
            "collection.csv",
            &format!("#schema_version: 1\n{}\n{}\n", header_line(), row),
        );

        let mut ledger = load_ledger(&path, &format).unwrap();
        let merged = consolidate(ledger.rows, vec![LedgerRow::new("Sol Ring", "c21", "263")]).unwrap();
        ledger.rows = merged.rows;
        save_ledger(&path, &ledger, &create_test_options(), &format).unwrap();

        let reloaded = load_ledger(&path, &format).unwrap();
        assert_eq!(reloaded.rows.len(), 1);
        assert_eq!(reloaded.rows[0].quantity, 2);
    }

    #[test]
    fn test_subtract_missing_keeps_rows() {
        let dir = TempDir::new().unwrap();
        let format = LedgerFormat::default();
        let path = dir.path().join("deck.csv");
        let options = create_test_options().with_backup(false);
        save_ledger(&path, &create_test_ledger(), &options, &format).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let mut ledger = load_ledger(&path, &format).unwrap();
        let result = subtract(ledger.rows, vec![LedgerRow::new("Black Lotus", "lea", "232")]).unwrap();
        ledger.rows = result.rows;
        save_ledger(&path, &ledger, &options, &format).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_quoted_text_values_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("collection.csv");
        let format = LedgerFormat::default();

        let mut cache = create_test_cache(sol_ring_json());
        cache.flavor_text = FaceValue::Single("a\"\"b".to_string());
        let mut ledger = Ledger::new();
        ledger.rows = vec![
            LedgerRow::new("\"Hi\"", "c21", "263").with_cache(cache),
            LedgerRow::new("\"Ach! Hans, Run!\"", "unh", "116"),
        ];

        save_ledger(&path, &ledger, &create_test_options(), &format).unwrap();
        let loaded = load_ledger(&path, &format).unwrap();

        let mut expected = ledger.rows.clone();
        sort_rows(&mut expected);
        assert_eq!(loaded.rows, expected);
        let hi = loaded.rows.iter().find(|r| r.set_code == "c21").unwrap();
        assert_eq!(hi.name, "\"Hi\"");
        assert_eq!(
            hi.cache.as_ref().unwrap().flavor_text,
            FaceValue::Single("a\"\"b".to_string())
        );
    }

    #[test]
    fn test_truncated_quote_fails_load() {
        let dir = TempDir::new().unwrap();
        let format = LedgerFormat::default();
        let good = LedgerRow::new("Sol Ring", "c21", "263").encode(&format).unwrap();
        let path = write_ledger(
            &dir,
            "collection.csv",
            &format!("#schema_version: 1\n{}\n{}\n1,\"Arcane Sig", header_line(), good),
        );

        let err = load_ledger(&path, &format).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRow { line: 4, .. }), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_keeps_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("collection.csv");
        let format = LedgerFormat::default();
        let options = create_test_options().with_backup(false);
        save_ledger(&path, &create_test_ledger(), &options, &format).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        save_ledger(&path, &create_test_ledger(), &options, &format).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }
}
