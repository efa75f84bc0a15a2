// 🎴 Card Vocabulary - closed enumerations stored in ledger columns
// Every token here is a ledger/catalog wire value; parsing is strict

use crate::values::ListItem;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generates `as_str`, `parse` and `Display` for a token enum.
macro_rules! token_enum {
    ($name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }

            /// Strict parse of a wire token.
            pub fn parse(token: &str) -> Option<Self> {
                match token {
                    $($token => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ============================================================================
// PRINTING ATTRIBUTES
// ============================================================================

/// Physical finish of a printing. Part of card identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finish {
    Normal,
    Foil,
    Etched,
}

token_enum!(Finish {
    Normal => "normal",
    Foil => "foil",
    Etched => "etched",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Mythic,
    Special,
    Bonus,
}

token_enum!(Rarity {
    Common => "common",
    Uncommon => "uncommon",
    Rare => "rare",
    Mythic => "mythic",
    Special => "special",
    Bonus => "bonus",
});

/// Grading of the physical copy (scanner vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Mint,
    NearMint,
    Excellent,
    Good,
    LightPlayed,
    Played,
    Poor,
}

token_enum!(Condition {
    Mint => "mint",
    NearMint => "near_mint",
    Excellent => "excellent",
    Good => "good",
    LightPlayed => "light_played",
    Played => "played",
    Poor => "poor",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    W,
    U,
    B,
    R,
    G,
}

token_enum!(Color {
    W => "W",
    U => "U",
    B => "B",
    R => "R",
    G => "G",
});

impl ListItem for Color {
    fn token(&self) -> String {
        self.as_str().to_string()
    }

    fn from_token(token: &str) -> Result<Self, String> {
        Color::parse(token).ok_or_else(|| format!("unknown color {:?}", token))
    }
}

// ============================================================================
// FORMATS & LEGALITIES
// ============================================================================

/// Play formats tracked by the catalog; one ledger column each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Standard,
    Future,
    Historic,
    Timeless,
    Gladiator,
    Pioneer,
    Explorer,
    Modern,
    Legacy,
    Pauper,
    Vintage,
    Penny,
    Commander,
    Oathbreaker,
    StandardBrawl,
    Brawl,
    Alchemy,
    PauperCommander,
    Duel,
    Oldschool,
    Premodern,
    Predh,
}

token_enum!(Format {
    Standard => "standard",
    Future => "future",
    Historic => "historic",
    Timeless => "timeless",
    Gladiator => "gladiator",
    Pioneer => "pioneer",
    Explorer => "explorer",
    Modern => "modern",
    Legacy => "legacy",
    Pauper => "pauper",
    Vintage => "vintage",
    Penny => "penny",
    Commander => "commander",
    Oathbreaker => "oathbreaker",
    StandardBrawl => "standardbrawl",
    Brawl => "brawl",
    Alchemy => "alchemy",
    PauperCommander => "paupercommander",
    Duel => "duel",
    Oldschool => "oldschool",
    Premodern => "premodern",
    Predh => "predh",
});

impl Format {
    pub const COUNT: usize = 22;

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Legality {
    Legal,
    #[default]
    NotLegal,
    Restricted,
    Banned,
}

token_enum!(Legality {
    Legal => "legal",
    NotLegal => "not_legal",
    Restricted => "restricted",
    Banned => "banned",
});

/// Fixed table: one legality per known format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Legalities([Legality; Format::COUNT]);

impl Legalities {
    pub fn get(&self, format: Format) -> Legality {
        self.0[format.index()]
    }

    pub fn set(&mut self, format: Format, legality: Legality) {
        self.0[format.index()] = legality;
    }

    pub fn with(mut self, format: Format, legality: Legality) -> Self {
        self.set(format, legality);
        self
    }

    /// Formats in column order with their legality.
    pub fn iter(&self) -> impl Iterator<Item = (Format, Legality)> + '_ {
        Format::ALL.iter().map(move |f| (*f, self.get(*f)))
    }

    /// Build from catalog key/value pairs. Unknown formats are ignored,
    /// unknown legality tokens are reported.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, String> {
        let mut legalities = Legalities::default();
        for (format, legality) in pairs {
            let Some(format) = Format::parse(format) else {
                continue;
            };
            let legality = Legality::parse(legality)
                .ok_or_else(|| format!("unknown legality {:?} for {}", legality, format))?;
            legalities.set(format, legality);
        }
        Ok(legalities)
    }
}
