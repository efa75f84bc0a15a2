// 📚 Catalog - external card reference data and its cached snapshot
// The lookup service is a collaborator; the core only sees `CatalogLookup`.
//
// Cache policy per attribute:
//   root-level value present  → Single
//   only per-face values      → PerFace (one per face)
//   neither                   → Absent

use crate::card::{Color, Legalities};
use crate::error::{LedgerError, Result};
use crate::faces::FaceValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

// ============================================================================
// CATALOG ENTRY (wire model)
// ============================================================================

/// One printing as served by the catalog (card object subset).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: Uuid,
    #[serde(default)]
    pub oracle_id: Option<Uuid>,
    pub name: String,
    pub set: String,
    #[serde(default)]
    pub set_name: String,
    pub collector_number: String,
    #[serde(default)]
    pub layout: String,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub mana_cost: Option<String>,
    #[serde(default)]
    pub cmc: Option<f64>,
    #[serde(default)]
    pub type_line: Option<String>,
    #[serde(default)]
    pub oracle_text: Option<String>,
    #[serde(default)]
    pub power: Option<String>,
    #[serde(default)]
    pub toughness: Option<String>,
    #[serde(default)]
    pub loyalty: Option<String>,
    #[serde(default)]
    pub colors: Option<Vec<Color>>,
    #[serde(default)]
    pub color_identity: Vec<Color>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub frame_effects: Option<Vec<String>>,
    #[serde(default)]
    pub full_art: bool,
    #[serde(default)]
    pub promo_types: Option<Vec<String>>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub flavor_text: Option<String>,
    #[serde(default)]
    pub legalities: BTreeMap<String, String>,
    #[serde(default)]
    pub card_faces: Option<Vec<CardFace>>,
}

/// One printed face of a multi-face card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardFace {
    pub name: String,
    #[serde(default)]
    pub oracle_id: Option<Uuid>,
    #[serde(default)]
    pub mana_cost: Option<String>,
    #[serde(default)]
    pub type_line: Option<String>,
    #[serde(default)]
    pub oracle_text: Option<String>,
    #[serde(default)]
    pub power: Option<String>,
    #[serde(default)]
    pub toughness: Option<String>,
    #[serde(default)]
    pub loyalty: Option<String>,
    #[serde(default)]
    pub colors: Option<Vec<Color>>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub flavor_text: Option<String>,
}

// ============================================================================
// LOOKUP COLLABORATOR
// ============================================================================

#[derive(Error, Debug)]
pub enum LookupError {
    /// The catalog has no such printing
    #[error("no catalog entry for {0}")]
    NotFound(String),

    /// The catalog could not answer right now; retry later
    #[error("catalog unavailable: {0}")]
    Transient(String),
}

/// Synchronous catalog lookup by printing.
pub trait CatalogLookup {
    fn fetch(
        &self,
        name: Option<&str>,
        set_code: &str,
        collector_number: &str,
    ) -> std::result::Result<CatalogEntry, LookupError>;
}

/// File-backed catalog mirror: `<root>/<set_code>/<collector_number>.json`.
pub struct LocalCatalog {
    root: PathBuf,
}

impl LocalCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalCatalog { root: root.into() }
    }

    pub fn entry_path(&self, set_code: &str, collector_number: &str) -> Option<PathBuf> {
        let plain = |s: &str| {
            !s.is_empty() && !s.contains(['/', '\\']) && s != "." && s != ".."
        };
        if !plain(set_code) || !plain(collector_number) {
            return None;
        }
        Some(
            self.root
                .join(set_code.to_lowercase())
                .join(format!("{}.json", collector_number)),
        )
    }
}

impl CatalogLookup for LocalCatalog {
    fn fetch(
        &self,
        name: Option<&str>,
        set_code: &str,
        collector_number: &str,
    ) -> std::result::Result<CatalogEntry, LookupError> {
        let printing = format!("{} #{}", set_code, collector_number);
        let path = self
            .entry_path(set_code, collector_number)
            .ok_or_else(|| LookupError::NotFound(printing.clone()))?;

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LookupError::NotFound(printing));
            }
            Err(e) => {
                return Err(LookupError::Transient(format!("{}: {}", path.display(), e)));
            }
        };

        let entry: CatalogEntry = serde_json::from_str(&text)
            .map_err(|e| LookupError::Transient(format!("{}: {}", path.display(), e)))?;

        if let Some(name) = name {
            if !names_match(name, &entry) {
                return Err(LookupError::NotFound(format!("{} named {:?}", printing, name)));
            }
        }

        debug!(set = set_code, number = collector_number, "catalog hit");
        Ok(entry)
    }
}

/// Scanners sometimes report only the front face name.
fn names_match(name: &str, entry: &CatalogEntry) -> bool {
    if name.eq_ignore_ascii_case(&entry.name) {
        return true;
    }
    entry
        .card_faces
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|face| name.eq_ignore_ascii_case(&face.name))
}

// ============================================================================
// CATALOG CACHE (ledger-side snapshot)
// ============================================================================

/// Flattened snapshot of a catalog entry, owned by exactly one ledger row.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogCache {
    /// Catalog unique id of the printing
    pub scryfall_id: Uuid,
    pub oracle_id: FaceValue<Uuid>,
    pub layout: String,

    /// Face names; its arity is the card's face count
    pub face_names: FaceValue<String>,
    pub mana_cost: FaceValue<String>,
    pub cmc: Option<f64>,
    pub type_line: FaceValue<String>,
    pub oracle_text: FaceValue<String>,
    pub power: FaceValue<String>,
    pub toughness: FaceValue<String>,
    pub loyalty: FaceValue<String>,
    pub colors: FaceValue<Vec<Color>>,
    pub color_identity: Vec<Color>,
    pub keywords: Vec<String>,

    // Visual-variant markers (part of identity)
    pub frame_effects: Option<Vec<String>>,
    pub full_art: bool,
    pub promo_types: Option<Vec<String>>,

    pub artist: FaceValue<String>,
    pub flavor_text: FaceValue<String>,
    pub legalities: Legalities,
    pub fetched_at: DateTime<Utc>,
}

impl CatalogCache {
    /// Minimal single-face snapshot; the remaining attributes start absent.
    pub fn new(scryfall_id: Uuid, name: impl Into<String>, fetched_at: DateTime<Utc>) -> Self {
        CatalogCache {
            scryfall_id,
            oracle_id: FaceValue::Absent,
            layout: "normal".to_string(),
            face_names: FaceValue::Single(name.into()),
            mana_cost: FaceValue::Absent,
            cmc: None,
            type_line: FaceValue::Absent,
            oracle_text: FaceValue::Absent,
            power: FaceValue::Absent,
            toughness: FaceValue::Absent,
            loyalty: FaceValue::Absent,
            colors: FaceValue::Absent,
            color_identity: Vec::new(),
            keywords: Vec::new(),
            frame_effects: None,
            full_art: false,
            promo_types: None,
            artist: FaceValue::Absent,
            flavor_text: FaceValue::Absent,
            legalities: Legalities::default(),
            fetched_at,
        }
    }

    /// Snapshot a catalog entry.
    pub fn from_entry(entry: &CatalogEntry, fetched_at: DateTime<Utc>) -> Result<Self> {
        let faces = entry.card_faces.as_deref().filter(|f| !f.is_empty());

        let face_names = match faces {
            Some(faces) => FaceValue::from_faces(faces.iter().map(|f| f.name.clone()).collect()),
            None => FaceValue::Single(entry.name.clone()),
        };

        let legalities = Legalities::from_pairs(
            entry
                .legalities
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )
        .map_err(|reason| LedgerError::InvalidCatalogEntry {
            card: entry.name.clone(),
            reason,
        })?;

        let cache = CatalogCache {
            scryfall_id: entry.id,
            oracle_id: FaceValue::from_source(entry.oracle_id, faces, |f| f.oracle_id),
            layout: entry.layout.clone(),
            face_names,
            mana_cost: FaceValue::from_source(entry.mana_cost.clone(), faces, |f| {
                f.mana_cost.clone()
            }),
            cmc: entry.cmc,
            type_line: FaceValue::from_source(entry.type_line.clone(), faces, |f| {
                f.type_line.clone()
            }),
            oracle_text: FaceValue::from_source(entry.oracle_text.clone(), faces, |f| {
                f.oracle_text.clone()
            }),
            power: FaceValue::from_source(entry.power.clone(), faces, |f| f.power.clone()),
            toughness: FaceValue::from_source(entry.toughness.clone(), faces, |f| {
                f.toughness.clone()
            }),
            loyalty: FaceValue::from_source(entry.loyalty.clone(), faces, |f| f.loyalty.clone()),
            colors: FaceValue::from_source(entry.colors.clone(), faces, |f| f.colors.clone()),
            color_identity: entry.color_identity.clone(),
            keywords: entry.keywords.clone(),
            frame_effects: entry.frame_effects.clone(),
            full_art: entry.full_art,
            promo_types: entry.promo_types.clone(),
            artist: FaceValue::from_source(entry.artist.clone(), faces, |f| f.artist.clone()),
            flavor_text: FaceValue::from_source(entry.flavor_text.clone(), faces, |f| {
                f.flavor_text.clone()
            }),
            legalities,
            fetched_at,
        };

        cache.validate()?;
        Ok(cache)
    }

    /// Number of printed faces.
    pub fn face_count(&self) -> usize {
        self.face_names.arity().max(1)
    }

    /// Every per-face attribute must agree with the face count.
    pub fn validate(&self) -> Result<()> {
        let faces = self.face_count();
        self.oracle_id.check_arity("oracle_id", faces)?;
        self.mana_cost.check_arity("mana_cost", faces)?;
        self.type_line.check_arity("type_line", faces)?;
        self.oracle_text.check_arity("oracle_text", faces)?;
        self.power.check_arity("power", faces)?;
        self.toughness.check_arity("toughness", faces)?;
        self.loyalty.check_arity("loyalty", faces)?;
        self.colors.check_arity("colors", faces)?;
        self.artist.check_arity("artist", faces)?;
        self.flavor_text.check_arity("flavor_text", faces)?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::card::{Format, Legality};
    use chrono::TimeZone;

    pub(crate) fn sol_ring_json() -> serde_json::Value {
        serde_json::json!({
            "id": "7d6d4a4f-92c1-4e0e-9f1b-6a3c0f0f2a11",
            "oracle_id": "6ad8011d-3471-4369-9d68-b264cc027487",
            "name": "Sol Ring",
            "set": "c21",
            "set_name": "Commander 2021",
            "collector_number": "263",
            "layout": "normal",
            "rarity": "uncommon",
            "mana_cost": "{1}",
            "cmc": 1.0,
            "type_line": "Artifact",
            "oracle_text": "{T}: Add {C}{C}.",
            "colors": [],
            "color_identity": [],
            "keywords": [],
            "full_art": false,
            "artist": "Mike Bierek",
            "legalities": {
                "commander": "legal",
                "vintage": "restricted",
                "legacy": "banned",
                "modern": "not_legal"
            }
        })
    }

    pub(crate) fn delver_json() -> serde_json::Value {
        serde_json::json!({
            "id": "11bf83bb-c95b-4b4f-9a56-ce7a1816307a",
            "name": "Delver of Secrets // Insectile Aberration",
            "set": "isd",
            "set_name": "Innistrad",
            "collector_number": "51",
            "layout": "transform",
            "rarity": "common",
            "cmc": 1.0,
            "type_line": "Creature — Human Wizard // Creature — Human Insect",
            "color_identity": ["U"],
            "keywords": ["Flying", "Transform"],
            "frame_effects": ["sunmoondfc"],
            "full_art": false,
            "legalities": { "legacy": "legal", "pauper": "legal" },
            "card_faces": [
                {
                    "name": "Delver of Secrets",
                    "mana_cost": "{U}",
                    "type_line": "Creature — Human Wizard",
                    "oracle_text": "At the beginning of your upkeep, look at the top card of your library.",
                    "power": "1",
                    "toughness": "1",
                    "colors": ["U"],
                    "artist": "Nils Hamm"
                },
                {
                    "name": "Insectile Aberration",
                    "mana_cost": "",
                    "type_line": "Creature — Human Insect",
                    "oracle_text": "Flying",
                    "power": "3",
                    "toughness": "2",
                    "colors": ["U"],
                    "artist": "Nils Hamm"
                }
            ]
        })
    }

    pub(crate) fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_single_face_entry() {
        let entry: CatalogEntry = serde_json::from_value(sol_ring_json()).unwrap();
        let cache = CatalogCache::from_entry(&entry, fetched_at()).unwrap();

        assert_eq!(cache.face_count(), 1);
        assert_eq!(cache.face_names, FaceValue::Single("Sol Ring".to_string()));
        assert_eq!(cache.mana_cost, FaceValue::Single("{1}".to_string()));
        // colorless: present but empty, not absent
        assert_eq!(cache.colors, FaceValue::Single(Vec::new()));
        assert!(cache.loyalty.is_absent());
        assert_eq!(cache.frame_effects, None);
        assert_eq!(cache.legalities.get(Format::Vintage), Legality::Restricted);
        assert_eq!(cache.legalities.get(Format::Legacy), Legality::Banned);
        assert_eq!(cache.legalities.get(Format::Pauper), Legality::NotLegal);
    }

    #[test]
    fn test_multi_face_entry() {
        let entry: CatalogEntry = serde_json::from_value(delver_json()).unwrap();
        let cache = CatalogCache::from_entry(&entry, fetched_at()).unwrap();

        assert_eq!(cache.face_count(), 2);
        // root-level type line wins over per-face values
        assert!(matches!(cache.type_line, FaceValue::Single(_)));
        assert_eq!(
            cache.power,
            FaceValue::PerFace(vec!["1".to_string(), "3".to_string()])
        );
        assert_eq!(
            cache.colors,
            FaceValue::PerFace(vec![vec![Color::U], vec![Color::U]])
        );
        assert!(cache.oracle_id.is_absent());
        assert!(cache.flavor_text.is_absent());
        assert_eq!(cache.frame_effects, Some(vec!["sunmoondfc".to_string()]));
    }

    #[test]
    fn test_inconsistent_faces_fail_loudly() {
        let entry: CatalogEntry = serde_json::from_value(delver_json()).unwrap();
        let mut cache = CatalogCache::from_entry(&entry, fetched_at()).unwrap();
        cache.power = FaceValue::PerFace(vec!["1".into(), "3".into(), "5".into()]);

        let err = cache.validate().unwrap_err();
        assert!(matches!(
            err,
            LedgerError::FaceCountMismatch { attribute: "power", expected: 2, found: 3 }
        ));
    }

    #[test]
    fn test_unknown_legality_is_rejected() {
        let mut json = sol_ring_json();
        json["legalities"]["modern"] = serde_json::json!("sometimes");
        let entry: CatalogEntry = serde_json::from_value(json).unwrap();

        let err = CatalogCache::from_entry(&entry, fetched_at()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCatalogEntry { .. }));
    }

    #[test]
    fn test_local_catalog_lookup() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("isd")).unwrap();
        std::fs::write(
            dir.path().join("isd").join("51.json"),
            serde_json::to_string(&delver_json()).unwrap(),
        )
        .unwrap();

        let catalog = LocalCatalog::new(dir.path());

        let entry = catalog.fetch(Some("Delver of Secrets"), "ISD", "51").unwrap();
        assert_eq!(entry.collector_number, "51");

        let err = catalog.fetch(None, "isd", "52").unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));

        let err = catalog.fetch(Some("Sol Ring"), "isd", "51").unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));

        let err = catalog.fetch(None, "../etc", "51").unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));
    }

    #[test]
    fn test_local_catalog_corrupt_file_is_transient() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("c21")).unwrap();
        std::fs::write(dir.path().join("c21").join("263.json"), "{ not json").unwrap();

        let catalog = LocalCatalog::new(dir.path());
        let err = catalog.fetch(None, "c21", "263").unwrap_err();
        assert!(matches!(err, LookupError::Transient(_)));
    }
}
