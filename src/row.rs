// 📄 Ledger Row Model - one physical card printing + quantity + optional cache
// Columns map to fields through one explicit table; the header is validated
// once, so an unknown or missing column is a single up-front error.

use crate::card::{Color, Condition, Finish, Format, Legalities, Legality, Rarity};
use crate::catalog::CatalogCache;
use crate::codec::{encode_field, join_record, Record};
use crate::config::LedgerFormat;
use crate::error::{LedgerError, Result};
use crate::faces::{optional_from_field, optional_to_field, FaceValue};
use crate::values::FieldValue;
use chrono::{DateTime, SecondsFormat, Utc};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// COLUMNS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    // Identity & description
    Quantity,
    Name,
    SetCode,
    SetName,
    CollectorNumber,
    Finish,
    Rarity,
    Condition,
    Language,

    // Catalog cache
    ScryfallId,
    OracleId,
    Layout,
    FaceNames,
    ManaCost,
    Cmc,
    TypeLine,
    OracleText,
    Power,
    Toughness,
    Loyalty,
    Colors,
    ColorIdentity,
    Keywords,
    FrameEffects,
    FullArt,
    PromoTypes,
    Artist,
    FlavorText,
    Legality(Format),
    FetchedAt,
}

const LEADING: &[Column] = &[
    Column::Quantity,
    Column::Name,
    Column::SetCode,
    Column::SetName,
    Column::CollectorNumber,
    Column::Finish,
    Column::Rarity,
    Column::Condition,
    Column::Language,
    Column::ScryfallId,
    Column::OracleId,
    Column::Layout,
    Column::FaceNames,
    Column::ManaCost,
    Column::Cmc,
    Column::TypeLine,
    Column::OracleText,
    Column::Power,
    Column::Toughness,
    Column::Loyalty,
    Column::Colors,
    Column::ColorIdentity,
    Column::Keywords,
    Column::FrameEffects,
    Column::FullArt,
    Column::PromoTypes,
    Column::Artist,
    Column::FlavorText,
];

impl Column {
    /// All columns in canonical (written) order.
    pub fn canonical() -> Vec<Column> {
        let mut columns = LEADING.to_vec();
        columns.extend(Format::ALL.iter().map(|f| Column::Legality(*f)));
        columns.push(Column::FetchedAt);
        columns
    }

    pub fn name(&self) -> Cow<'static, str> {
        let name = match self {
            Column::Quantity => "quantity",
            Column::Name => "name",
            Column::SetCode => "set_code",
            Column::SetName => "set_name",
            Column::CollectorNumber => "collector_number",
            Column::Finish => "finish",
            Column::Rarity => "rarity",
            Column::Condition => "condition",
            Column::Language => "language",
            Column::ScryfallId => "scryfall_id",
            Column::OracleId => "oracle_id",
            Column::Layout => "layout",
            Column::FaceNames => "face_names",
            Column::ManaCost => "mana_cost",
            Column::Cmc => "cmc",
            Column::TypeLine => "type_line",
            Column::OracleText => "oracle_text",
            Column::Power => "power",
            Column::Toughness => "toughness",
            Column::Loyalty => "loyalty",
            Column::Colors => "colors",
            Column::ColorIdentity => "color_identity",
            Column::Keywords => "keywords",
            Column::FrameEffects => "frame_effects",
            Column::FullArt => "full_art",
            Column::PromoTypes => "promo_types",
            Column::Artist => "artist",
            Column::FlavorText => "flavor_text",
            Column::Legality(format) => return Cow::Owned(format!("legality_{}", format)),
            Column::FetchedAt => "fetched_at",
        };
        Cow::Borrowed(name)
    }

    pub fn parse(name: &str) -> Option<Column> {
        if let Some(format) = name.strip_prefix("legality_") {
            return Format::parse(format).map(Column::Legality);
        }
        LEADING
            .iter()
            .chain(std::iter::once(&Column::FetchedAt))
            .find(|c| c.name() == name)
            .copied()
    }

    /// Free-text columns are always written quoted.
    pub fn is_quoted(&self) -> bool {
        matches!(
            self,
            Column::Name
                | Column::SetName
                | Column::FaceNames
                | Column::ManaCost
                | Column::TypeLine
                | Column::OracleText
                | Column::Power
                | Column::Toughness
                | Column::Loyalty
                | Column::Colors
                | Column::ColorIdentity
                | Column::Keywords
                | Column::FrameEffects
                | Column::PromoTypes
                | Column::Artist
                | Column::FlavorText
        )
    }

    /// Columns that belong to the catalog cache block.
    pub fn is_cache(&self) -> bool {
        !matches!(
            self,
            Column::Quantity
                | Column::Name
                | Column::SetCode
                | Column::SetName
                | Column::CollectorNumber
                | Column::Finish
                | Column::Rarity
                | Column::Condition
                | Column::Language
        )
    }
}

/// The canonical header line.
pub fn header_line() -> String {
    let names: Vec<Cow<'static, str>> = Column::canonical().iter().map(|c| c.name()).collect();
    join_record(&names)
}

/// Header position of every known column.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    positions: HashMap<Column, usize>,
    width: usize,
}

impl ColumnMap {
    /// Map a header record. Unknown, duplicate and missing columns are all
    /// reported together.
    pub fn from_header(fields: &[String]) -> Result<Self> {
        let mut positions = HashMap::new();
        let mut problems = Vec::new();

        for (i, name) in fields.iter().enumerate() {
            let name = name.trim();
            match Column::parse(name) {
                Some(column) => {
                    if positions.insert(column, i).is_some() {
                        problems.push(format!("duplicate column `{}`", name));
                    }
                }
                None => problems.push(format!("unknown column `{}`", name)),
            }
        }

        for column in Column::canonical() {
            if !positions.contains_key(&column) {
                problems.push(format!("missing column `{}`", column.name()));
            }
        }

        if !problems.is_empty() {
            return Err(LedgerError::InvalidHeader(problems.join(", ")));
        }

        Ok(ColumnMap {
            positions,
            width: fields.len(),
        })
    }

    /// Mapping for the canonical header.
    pub fn canonical() -> Self {
        let columns = Column::canonical();
        ColumnMap {
            width: columns.len(),
            positions: columns.into_iter().enumerate().map(|(i, c)| (c, i)).collect(),
        }
    }

    fn get<'a>(&self, record: &'a Record, column: Column) -> &'a str {
        self.positions
            .get(&column)
            .and_then(|i| record.fields.get(*i))
            .map(String::as_str)
            .unwrap_or("")
    }
}

// ============================================================================
// LEDGER ROW
// ============================================================================

/// One persisted ledger line.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub quantity: u32,
    pub name: String,
    pub set_code: String,
    pub set_name: String,
    pub collector_number: String,
    pub finish: Finish,
    pub rarity: Rarity,
    pub condition: Condition,
    pub language: String,

    /// Snapshot of catalog data, exclusively owned by this row
    pub cache: Option<CatalogCache>,
}

impl LedgerRow {
    /// A single, cache-less copy with scanner defaults.
    pub fn new(
        name: impl Into<String>,
        set_code: impl Into<String>,
        collector_number: impl Into<String>,
    ) -> Self {
        LedgerRow {
            quantity: 1,
            name: name.into(),
            set_code: set_code.into(),
            set_name: String::new(),
            collector_number: collector_number.into(),
            finish: Finish::Normal,
            rarity: Rarity::Common,
            condition: Condition::NearMint,
            language: "en".to_string(),
            cache: None,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_finish(mut self, finish: Finish) -> Self {
        self.finish = finish;
        self
    }

    pub fn with_set_name(mut self, set_name: impl Into<String>) -> Self {
        self.set_name = set_name.into();
        self
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_cache(mut self, cache: CatalogCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// Case-insensitive name, the ledger sort key.
    pub fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }

    // ========================================================================
    // ENCODING
    // ========================================================================

    /// Field text for one column (unescaped).
    fn column_value(&self, column: Column, format: &LedgerFormat) -> Result<String> {
        let value = match column {
            Column::Quantity => self.quantity.to_string(),
            Column::Name => self.name.clone(),
            Column::SetCode => self.set_code.clone(),
            Column::SetName => self.set_name.clone(),
            Column::CollectorNumber => self.collector_number.clone(),
            Column::Finish => self.finish.as_str().to_string(),
            Column::Rarity => self.rarity.as_str().to_string(),
            Column::Condition => self.condition.as_str().to_string(),
            Column::Language => self.language.clone(),
            cache_column => match &self.cache {
                Some(cache) => cache_value(cache, cache_column, format)?,
                None => String::new(),
            },
        };
        Ok(value)
    }

    /// Encode as one record line in canonical column order.
    pub fn encode(&self, format: &LedgerFormat) -> Result<String> {
        let mut fields = Vec::new();
        for column in Column::canonical() {
            let value = self.column_value(column, format)?;
            let quote = column.is_quoted() && !(column.is_cache() && self.cache.is_none());
            fields.push(encode_field(&value, quote));
        }
        Ok(join_record(&fields))
    }

    // ========================================================================
    // DECODING
    // ========================================================================

    /// Decode one record. Any bad field fails the row.
    pub fn decode(record: &Record, columns: &ColumnMap, format: &LedgerFormat) -> Result<Self> {
        let line = record.line;
        if record.fields.len() != columns.width {
            return Err(malformed(
                line,
                "*",
                format!(
                    "expected {} fields, found {}",
                    columns.width,
                    record.fields.len()
                ),
            ));
        }

        let get = |column: Column| columns.get(record, column);
        // text is kept verbatim; only blank counts as missing
        let required = |column: Column| -> Result<String> {
            let value = get(column);
            if value.trim().is_empty() {
                return Err(malformed(line, &column.name(), "required field is empty".to_string()));
            }
            Ok(value.to_string())
        };

        let quantity = get(Column::Quantity).trim().parse::<u32>().map_err(|_| {
            malformed(
                line,
                "quantity",
                format!("{:?} is not a non-negative integer", get(Column::Quantity)),
            )
        })?;

        let finish = parse_token(line, Column::Finish, get(Column::Finish), Finish::parse)?;
        let rarity = parse_token(line, Column::Rarity, get(Column::Rarity), Rarity::parse)?;
        let condition =
            parse_token(line, Column::Condition, get(Column::Condition), Condition::parse)?;

        let cache = decode_cache(record, columns, format)?;

        Ok(LedgerRow {
            quantity,
            name: required(Column::Name)?,
            set_code: required(Column::SetCode)?,
            set_name: get(Column::SetName).to_string(),
            collector_number: required(Column::CollectorNumber)?,
            finish,
            rarity,
            condition,
            language: required(Column::Language)?,
            cache,
        })
    }
}

impl fmt::Display for LedgerRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} #{}, {})",
            self.name,
            self.set_code.to_uppercase(),
            self.collector_number,
            self.finish
        )
    }
}

fn malformed(line: usize, column: &str, reason: String) -> LedgerError {
    LedgerError::MalformedRow {
        line,
        column: column.to_string(),
        reason,
    }
}

fn parse_token<T>(
    line: usize,
    column: Column,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T> {
    parse(value.trim())
        .ok_or_else(|| malformed(line, &column.name(), format!("unknown value {:?}", value)))
}

fn cache_value(cache: &CatalogCache, column: Column, format: &LedgerFormat) -> Result<String> {
    let value = match column {
        Column::ScryfallId => cache.scryfall_id.to_string(),
        Column::OracleId => cache.oracle_id.to_field(format)?,
        Column::Layout => cache.layout.clone(),
        Column::FaceNames => cache.face_names.to_field(format)?,
        Column::ManaCost => cache.mana_cost.to_field(format)?,
        Column::Cmc => optional_to_field(&cache.cmc, format)?,
        Column::TypeLine => cache.type_line.to_field(format)?,
        Column::OracleText => cache.oracle_text.to_field(format)?,
        Column::Power => cache.power.to_field(format)?,
        Column::Toughness => cache.toughness.to_field(format)?,
        Column::Loyalty => cache.loyalty.to_field(format)?,
        Column::Colors => cache.colors.to_field(format)?,
        Column::ColorIdentity => cache.color_identity.to_field(format)?,
        Column::Keywords => cache.keywords.to_field(format)?,
        Column::FrameEffects => optional_to_field(&cache.frame_effects, format)?,
        Column::FullArt => cache.full_art.to_string(),
        Column::PromoTypes => optional_to_field(&cache.promo_types, format)?,
        Column::Artist => cache.artist.to_field(format)?,
        Column::FlavorText => cache.flavor_text.to_field(format)?,
        Column::Legality(f) => cache.legalities.get(f).as_str().to_string(),
        Column::FetchedAt => cache
            .fetched_at
            .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        _ => String::new(),
    };
    Ok(value)
}

fn decode_cache(
    record: &Record,
    columns: &ColumnMap,
    format: &LedgerFormat,
) -> Result<Option<CatalogCache>> {
    let line = record.line;
    let get = |column: Column| columns.get(record, column);

    if get(Column::ScryfallId).trim().is_empty() {
        let stray = Column::canonical()
            .into_iter()
            .filter(|c| c.is_cache())
            .find(|c| !get(*c).is_empty());
        if let Some(column) = stray {
            return Err(malformed(
                line,
                &column.name(),
                "cache data without scryfall_id".to_string(),
            ));
        }
        return Ok(None);
    }

    fn field<T>(
        line: usize,
        column: Column,
        parsed: std::result::Result<T, String>,
    ) -> Result<T> {
        parsed.map_err(|reason| malformed(line, &column.name(), reason))
    }

    let faces = |column: Column| -> Result<FaceValue<String>> {
        field(line, column, FaceValue::from_field(get(column), format))
    };

    let scryfall_id = field(
        line,
        Column::ScryfallId,
        Uuid::from_field(get(Column::ScryfallId).trim(), format),
    )?;

    let full_art = match get(Column::FullArt).trim() {
        "true" => true,
        "false" => false,
        other => {
            return Err(malformed(
                line,
                "full_art",
                format!("{:?} is not a boolean", other),
            ))
        }
    };

    let mut legalities = Legalities::default();
    for f in Format::ALL {
        let column = Column::Legality(*f);
        let legality = parse_token(line, column, get(column), Legality::parse)?;
        legalities.set(*f, legality);
    }

    let fetched_at = DateTime::parse_from_rfc3339(get(Column::FetchedAt).trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| malformed(line, "fetched_at", e.to_string()))?;

    let cache = CatalogCache {
        scryfall_id,
        oracle_id: field(
            line,
            Column::OracleId,
            FaceValue::<Uuid>::from_field(get(Column::OracleId), format),
        )?,
        layout: get(Column::Layout).to_string(),
        face_names: faces(Column::FaceNames)?,
        mana_cost: faces(Column::ManaCost)?,
        cmc: field(line, Column::Cmc, optional_from_field::<f64>(get(Column::Cmc), format))?,
        type_line: faces(Column::TypeLine)?,
        oracle_text: faces(Column::OracleText)?,
        power: faces(Column::Power)?,
        toughness: faces(Column::Toughness)?,
        loyalty: faces(Column::Loyalty)?,
        colors: field(
            line,
            Column::Colors,
            FaceValue::<Vec<Color>>::from_field(get(Column::Colors), format),
        )?,
        color_identity: field(
            line,
            Column::ColorIdentity,
            Vec::<Color>::from_field(get(Column::ColorIdentity), format),
        )?,
        keywords: field(
            line,
            Column::Keywords,
            Vec::<String>::from_field(get(Column::Keywords), format),
        )?,
        frame_effects: field(
            line,
            Column::FrameEffects,
            optional_from_field::<Vec<String>>(get(Column::FrameEffects), format),
        )?,
        full_art,
        promo_types: field(
            line,
            Column::PromoTypes,
            optional_from_field::<Vec<String>>(get(Column::PromoTypes), format),
        )?,
        artist: faces(Column::Artist)?,
        flavor_text: faces(Column::FlavorText)?,
        legalities,
        fetched_at,
    };

    cache.validate().map_err(|e| match e {
        LedgerError::FaceCountMismatch { attribute, .. } => malformed(line, attribute, e.to_string()),
        other => other,
    })?;

    Ok(Some(cache))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{delver_json, fetched_at, sol_ring_json};
    use crate::catalog::CatalogEntry;
    use crate::codec::split_records;

    fn create_test_cache(json: serde_json::Value) -> CatalogCache {
        let entry: CatalogEntry = serde_json::from_value(json).unwrap();
        CatalogCache::from_entry(&entry, fetched_at()).unwrap()
    }

    fn decode_line(line: &str) -> Result<LedgerRow> {
        let records = split_records(line, 2)?;
        LedgerRow::decode(&records[0], &ColumnMap::canonical(), &LedgerFormat::default())
    }

    fn round_trip(row: &LedgerRow) -> LedgerRow {
        let line = row.encode(&LedgerFormat::default()).unwrap();
        decode_line(&line).unwrap()
    }

    #[test]
    fn test_header_has_every_column_once() {
        let header = header_line();
        let fields: Vec<String> = header.split(',').map(str::to_string).collect();
        assert_eq!(fields.len(), Column::canonical().len());
        assert!(header.starts_with("quantity,name,set_code"));
        assert!(header.ends_with("legality_predh,fetched_at"));
        assert!(ColumnMap::from_header(&fields).is_ok());
    }

    #[test]
    fn test_header_any_order_accepted() {
        let mut fields: Vec<String> = Column::canonical().iter().map(|c| c.name().into_owned()).collect();
        fields.reverse();
        let map = ColumnMap::from_header(&fields).unwrap();

        let row = LedgerRow::new("Sol Ring", "c21", "263").with_quantity(4);
        let mut values: Vec<String> = Column::canonical()
            .iter()
            .map(|c| row.column_value(*c, &LedgerFormat::default()).unwrap())
            .collect();
        values.reverse();

        let record = Record { line: 2, fields: values };
        let decoded = LedgerRow::decode(&record, &map, &LedgerFormat::default()).unwrap();
        assert_eq!(decoded, row);
    }

    #[test]
    fn test_header_problems_reported_together() {
        let mut fields: Vec<String> = Column::canonical().iter().map(|c| c.name().into_owned()).collect();
        fields.retain(|f| f != "rarity");
        fields.push("price".to_string());
        fields.push("name".to_string());

        let err = ColumnMap::from_header(&fields).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing column `rarity`"));
        assert!(message.contains("unknown column `price`"));
        assert!(message.contains("duplicate column `name`"));
    }

    #[test]
    fn test_cacheless_row_round_trip() {
        let row = LedgerRow::new("Fire // Ice", "mh2", "290")
            .with_quantity(3)
            .with_set_name("Modern Horizons 2")
            .with_finish(Finish::Foil)
            .with_rarity(Rarity::Uncommon)
            .with_condition(Condition::LightPlayed);

        let line = row.encode(&LedgerFormat::default()).unwrap();
        assert!(line.starts_with("3,\"Fire // Ice\",mh2,\"Modern Horizons 2\",290,foil,uncommon,light_played,en,"));
        assert_eq!(round_trip(&row), row);
    }

    #[test]
    fn test_cached_row_round_trip() {
        let row = LedgerRow::new("Sol Ring", "c21", "263").with_cache(create_test_cache(sol_ring_json()));
        assert_eq!(round_trip(&row), row);
    }

    #[test]
    fn test_multi_face_row_round_trip() {
        let row = LedgerRow::new("Delver of Secrets // Insectile Aberration", "isd", "51")
            .with_quantity(2)
            .with_cache(create_test_cache(delver_json()));
        let decoded = round_trip(&row);

        assert_eq!(decoded, row);
        let cache = decoded.cache.unwrap();
        assert_eq!(cache.face_count(), 2);
        assert!(cache.flavor_text.is_absent());
    }

    #[test]
    fn test_text_with_delimiters_survives() {
        let mut cache = create_test_cache(sol_ring_json());
        cache.oracle_text = FaceValue::Single("Choose one, \"or both\"\nLine two".to_string());
        let row = LedgerRow::new("Odd, \"Quoted\" Card", "c21", "1").with_cache(cache);
        assert_eq!(round_trip(&row), row);
    }

    #[test]
    fn test_already_quoted_text_survives() {
        let mut cache = create_test_cache(sol_ring_json());
        cache.flavor_text = FaceValue::Single("\"Hi\"".to_string());
        let row = LedgerRow::new("\"Hi\"", "c21", "263").with_cache(cache);
        assert_eq!(round_trip(&row), row);
    }

    #[test]
    fn test_text_whitespace_kept_verbatim() {
        let row = LedgerRow::new("  Sol Ring ", "c21", "263").with_set_name(" Commander 2021 ");
        let decoded = round_trip(&row);
        assert_eq!(decoded.name, "  Sol Ring ");
        assert_eq!(decoded, row);
    }

    #[test]
    fn test_blank_name_is_fatal() {
        let row = LedgerRow::new("   ", "c21", "263");
        let line = row.encode(&LedgerFormat::default()).unwrap();
        let err = decode_line(&line).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRow { ref column, .. } if column == "name"));
    }

    #[test]
    fn test_bad_quantity_is_fatal() {
        let row = LedgerRow::new("Sol Ring", "c21", "263");
        let line = row.encode(&LedgerFormat::default()).unwrap();
        let bad = line.replacen("1,", "-1,", 1);

        let err = decode_line(&bad).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRow { ref column, .. } if column == "quantity"));
    }

    #[test]
    fn test_unknown_enum_is_fatal() {
        let row = LedgerRow::new("Sol Ring", "c21", "263");
        let line = row.encode(&LedgerFormat::default()).unwrap();
        let bad = line.replacen(",normal,", ",shiny,", 1);

        let err = decode_line(&bad).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRow { ref column, .. } if column == "finish"));
    }

    #[test]
    fn test_missing_name_is_fatal() {
        let row = LedgerRow::new("", "c21", "263");
        let line = row.encode(&LedgerFormat::default()).unwrap();

        let err = decode_line(&line).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRow { ref column, .. } if column == "name"));
    }

    #[test]
    fn test_short_record_is_fatal() {
        let err = decode_line("1,\"Sol Ring\",c21").unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn test_stray_cache_data_is_fatal() {
        let row = LedgerRow::new("Sol Ring", "c21", "263");
        let mut fields: Vec<String> = Column::canonical()
            .iter()
            .map(|c| row.column_value(*c, &LedgerFormat::default()).unwrap())
            .collect();
        let artist = Column::canonical().iter().position(|c| *c == Column::Artist).unwrap();
        fields[artist] = "Mike Bierek".to_string();

        let record = Record { line: 9, fields };
        let err = LedgerRow::decode(&record, &ColumnMap::canonical(), &LedgerFormat::default()).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRow { line: 9, ref column, .. } if column == "artist"));
    }

    #[test]
    fn test_face_count_mismatch_on_read_is_fatal() {
        let mut cache = create_test_cache(delver_json());
        cache.power = FaceValue::PerFace(vec!["1".into(), "3".into(), "9".into()]);
        let row = LedgerRow::new("Delver of Secrets", "isd", "51").with_cache(cache);
        let line = row.encode(&LedgerFormat::default()).unwrap();

        let err = decode_line(&line).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRow { ref column, .. } if column == "power"));
    }

    #[test]
    fn test_display_label() {
        let row = LedgerRow::new("Sol Ring", "c21", "263").with_finish(Finish::Etched);
        assert_eq!(row.to_string(), "Sol Ring (C21 #263, etched)");
    }
}
