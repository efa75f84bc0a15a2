// 📷 Scan Import - freshly scanned cards from scanner exports
// Each source has its own parser; every row becomes a cache-less LedgerRow.
// One bad row fails the whole import: a partial batch would lose cards.

use crate::card::{Condition, Finish, Rarity};
use crate::config::LedgerFormat;
use crate::ledger::load_ledger;
use crate::row::{header_line, LedgerRow};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// ============================================================================
// SOURCES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSource {
    /// ManaBox collection export
    ManaBox,

    /// Another ledger file (e.g. a whole deck list)
    Ledger,
}

impl ScanSource {
    pub fn name(&self) -> &str {
        match self {
            ScanSource::ManaBox => "ManaBox",
            ScanSource::Ledger => "Ledger",
        }
    }
}

/// Parser for one scan source.
pub trait ScanParser {
    fn parse(&self, path: &Path) -> Result<Vec<LedgerRow>>;

    fn source(&self) -> ScanSource;
}

/// Detect the source from the file's first meaningful line.
pub fn detect_source(path: &Path) -> Result<ScanSource> {
    let file = File::open(path).with_context(|| format!("Failed to open scan file: {}", path.display()))?;

    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let line = line.trim_start_matches('\u{feff}').trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') || line == header_line() {
            return Ok(ScanSource::Ledger);
        }
        if line.contains("Collector number") && line.contains("Set code") {
            return Ok(ScanSource::ManaBox);
        }
        return Err(anyhow!(
            "Could not detect scan source from header of {}",
            path.display()
        ));
    }

    Err(anyhow!("Scan file is empty: {}", path.display()))
}

pub fn get_parser(source: ScanSource, format: &LedgerFormat) -> Box<dyn ScanParser> {
    match source {
        ScanSource::ManaBox => Box::new(ManaBoxParser::new()),
        ScanSource::Ledger => Box::new(LedgerParser::new(format.clone())),
    }
}

/// Detect, then parse.
pub fn load_scan(path: &Path, format: &LedgerFormat) -> Result<Vec<LedgerRow>> {
    let source = detect_source(path)?;
    let cards = get_parser(source, format).parse(path)?;
    tracing::info!(source = source.name(), cards = cards.len(), "loaded scan");
    Ok(cards)
}

// ============================================================================
// MANABOX
// ============================================================================

#[derive(Debug, Deserialize)]
struct ManaBoxRecord {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Set code")]
    set_code: String,
    #[serde(rename = "Set name", default)]
    set_name: String,
    #[serde(rename = "Collector number")]
    collector_number: String,
    #[serde(rename = "Foil")]
    foil: String,
    #[serde(rename = "Rarity")]
    rarity: String,
    #[serde(rename = "Quantity")]
    quantity: u32,
    #[serde(rename = "Condition")]
    condition: String,
    #[serde(rename = "Language")]
    language: String,
}

pub struct ManaBoxParser;

impl ManaBoxParser {
    pub fn new() -> Self {
        ManaBoxParser
    }

    fn to_row(record: ManaBoxRecord) -> Result<LedgerRow> {
        let finish = Finish::parse(record.foil.trim())
            .ok_or_else(|| anyhow!("unknown finish {:?}", record.foil))?;
        let rarity = Rarity::parse(record.rarity.trim())
            .ok_or_else(|| anyhow!("unknown rarity {:?}", record.rarity))?;
        let condition = Condition::parse(record.condition.trim())
            .ok_or_else(|| anyhow!("unknown condition {:?}", record.condition))?;

        for (field, value) in [
            ("Name", &record.name),
            ("Set code", &record.set_code),
            ("Collector number", &record.collector_number),
            ("Language", &record.language),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("required field `{}` is empty", field));
            }
        }

        Ok(LedgerRow::new(
            record.name.trim(),
            record.set_code.trim().to_lowercase(),
            record.collector_number.trim(),
        )
        .with_quantity(record.quantity)
        .with_set_name(record.set_name.trim())
        .with_finish(finish)
        .with_rarity(rarity)
        .with_condition(condition)
        .with_language(record.language.trim()))
    }
}

impl Default for ManaBoxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanParser for ManaBoxParser {
    fn parse(&self, path: &Path) -> Result<Vec<LedgerRow>> {
        use csv::ReaderBuilder;

        let file = File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(file);

        let mut cards = Vec::new();
        for (line_num, result) in reader.deserialize::<ManaBoxRecord>().enumerate() {
            // +2: 1-indexed plus header row
            let line = line_num + 2;
            let record = result
                .with_context(|| format!("Failed to parse scan line {} in {}", line, path.display()))?;
            let card = Self::to_row(record)
                .with_context(|| format!("Invalid card on scan line {} in {}", line, path.display()))?;
            cards.push(card);
        }

        Ok(cards)
    }

    fn source(&self) -> ScanSource {
        ScanSource::ManaBox
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// Reads another ledger's rows, caches included.
pub struct LedgerParser {
    format: LedgerFormat,
}

impl LedgerParser {
    pub fn new(format: LedgerFormat) -> Self {
        LedgerParser { format }
    }
}

impl ScanParser for LedgerParser {
    fn parse(&self, path: &Path) -> Result<Vec<LedgerRow>> {
        let ledger = load_ledger(path, &self.format)
            .with_context(|| format!("Failed to read ledger {}", path.display()))?;
        Ok(ledger.rows)
    }

    fn source(&self) -> ScanSource {
        ScanSource::Ledger
    }
}

// ============================================================================
// TESTS
// ============================================================================
