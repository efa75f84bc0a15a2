// 🔁 Consolidation Engine - merge scanned quantities into a ledger by identity
// Rows are matched by card identity, never by position. Two strategies:
// catalog id (both sides cached) or printing tuple (fallback).

use crate::error::{LedgerError, Result};
use crate::row::LedgerRow;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ============================================================================
// CARD IDENTITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// Both rows cached: catalog id, finish, frame effects, full art, promo types
    CatalogId,

    /// At least one row uncached: set code, collector number, finish
    Printing,
}

/// Which identity branch applies to a pair. Symmetric by construction.
pub fn match_strategy(a: &LedgerRow, b: &LedgerRow) -> MatchStrategy {
    if a.has_cache() && b.has_cache() {
        MatchStrategy::CatalogId
    } else {
        MatchStrategy::Printing
    }
}

/// Identity equality, recomputed on every call: a backfilled cache changes
/// which branch later comparisons take.
pub fn same_card(a: &LedgerRow, b: &LedgerRow) -> bool {
    if a.finish != b.finish {
        return false;
    }

    match (match_strategy(a, b), &a.cache, &b.cache) {
        (MatchStrategy::CatalogId, Some(x), Some(y)) => {
            x.scryfall_id == y.scryfall_id
                && x.frame_effects == y.frame_effects
                && x.full_art == y.full_art
                && x.promo_types == y.promo_types
        }
        _ => {
            // Set codes are case-insensitive across scanners and the catalog
            a.set_code.eq_ignore_ascii_case(&b.set_code)
                && a.collector_number == b.collector_number
        }
    }
}

/// Index of the single row matching `card`, if any.
/// More than one match means the ledger is corrupt.
fn find_unique(rows: &[LedgerRow], card: &LedgerRow) -> Result<Option<usize>> {
    let mut found = None;
    let mut count = 0;

    for (i, row) in rows.iter().enumerate() {
        if same_card(row, card) {
            count += 1;
            found.get_or_insert(i);
        }
    }

    if count > 1 {
        return Err(LedgerError::AmbiguousIdentity {
            card: card.to_string(),
            count,
        });
    }
    Ok(found)
}

// ============================================================================
// CONSOLIDATE
// ============================================================================

#[derive(Debug, Clone)]
pub struct Consolidation {
    /// Merged row set (unordered; saving sorts it)
    pub rows: Vec<LedgerRow>,

    /// Incoming entries folded into an existing row
    pub merged: usize,

    /// Incoming entries added as new rows
    pub appended: usize,
}

/// Merge incoming (card, quantity) rows into `existing`.
///
/// A match sums quantities and keeps the existing row's cache; a cache is
/// only attached when the existing row had none. Unmatched cards become new
/// rows carrying their own cache. Incoming duplicates accumulate.
pub fn consolidate(
    existing: Vec<LedgerRow>,
    incoming: impl IntoIterator<Item = LedgerRow>,
) -> Result<Consolidation> {
    let mut rows = existing;
    let mut merged = 0;
    let mut appended = 0;

    for card in incoming {
        match find_unique(&rows, &card)? {
            Some(i) => {
                let strategy = match_strategy(&rows[i], &card);
                let row = &mut rows[i];
                row.quantity = row
                    .quantity
                    .checked_add(card.quantity)
                    .ok_or_else(|| LedgerError::QuantityOverflow {
                        card: card.to_string(),
                    })?;
                if row.cache.is_none() && card.cache.is_some() {
                    row.cache = card.cache;
                }
                debug!(card = %row, quantity = row.quantity, ?strategy, "merged into existing row");
                merged += 1;
            }
            None => {
                debug!(card = %card, quantity = card.quantity, "appended new row");
                rows.push(card);
                appended += 1;
            }
        }
    }

    Ok(Consolidation {
        rows,
        merged,
        appended,
    })
}

// ============================================================================
// SUBTRACT
// ============================================================================

#[derive(Debug, Clone)]
pub struct Subtraction {
    /// Remaining row set
    pub rows: Vec<LedgerRow>,

    /// One single-copy row per unit actually pulled, with the source cache
    pub removed: Vec<LedgerRow>,

    /// Removal requests that matched nothing (no-ops)
    pub missing: Vec<LedgerRow>,
}

/// Pull cards out of `existing`, one physical copy per entry of `to_remove`.
///
/// The entry's own quantity is not consulted. A copy from a single-copy row
/// deletes the row. Unmatched entries are logged and skipped.
pub fn subtract(
    existing: Vec<LedgerRow>,
    to_remove: impl IntoIterator<Item = LedgerRow>,
) -> Result<Subtraction> {
    let mut rows = existing;
    let mut removed = Vec::new();
    let mut missing = Vec::new();

    for card in to_remove {
        let Some(i) = find_unique(&rows, &card)? else {
            warn!(card = %card, "card to remove not found; skipping");
            missing.push(card);
            continue;
        };

        let mut pulled = rows[i].clone();
        pulled.quantity = 1;
        removed.push(pulled);

        if rows[i].quantity > 1 {
            rows[i].quantity -= 1;
            debug!(card = %rows[i], quantity = rows[i].quantity, "decremented row");
        } else {
            let row = rows.remove(i);
            debug!(card = %row, "removed last copy");
        }
    }

    Ok(Subtraction {
        rows,
        removed,
        missing,
    })
}

/// Expand a (card, quantity) list into one removal entry per copy.
pub fn one_per_copy(cards: impl IntoIterator<Item = LedgerRow>) -> Vec<LedgerRow> {
    cards
        .into_iter()
        .flat_map(|card| {
            let copies = card.quantity as usize;
            std::iter::repeat(card.with_quantity(1)).take(copies)
        })
        .collect()
}

/// Total copies across rows.
pub fn total_quantity(rows: &[LedgerRow]) -> u64 {
    rows.iter().map(|r| r.quantity as u64).sum()
}

// ============================================================================
// TESTS
// ============================================================================
