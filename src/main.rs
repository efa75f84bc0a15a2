use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use card_ledger::consolidation::total_quantity;
use card_ledger::inventory::{ensure_root, target_for};
use card_ledger::{
    load_scan, CatalogLookup, Inventory, InventoryConfig, LocalCatalog, LogProgress,
    Target,
};

#[derive(Parser, Debug)]
#[command(name = "card-ledger", version, about = "Plain-text card collection and deck ledgers")]
struct Cli {
    /// Directory holding collection.csv and decks/
    #[arg(long, global = true, default_value = ".", env = "CARD_LEDGER_ROOT")]
    root: PathBuf,

    /// Skip the timestamped backup before rewriting a ledger
    #[arg(long, global = true)]
    no_backup: bool,

    /// Local catalog mirror (<dir>/<set>/<number>.json)
    #[arg(long, global = true, env = "CARD_LEDGER_CATALOG")]
    catalog: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add scanned cards to the collection or a deck
    Add {
        scan: PathBuf,
        #[arg(long)]
        deck: Option<String>,
    },
    /// Move scanned cards from the collection into a deck
    Move {
        scan: PathBuf,
        #[arg(long)]
        deck: String,
    },
    /// Return scanned cards from a deck to the collection
    Return {
        scan: PathBuf,
        #[arg(long)]
        deck: String,
    },
    /// Create an empty deck
    NewDeck { name: String },
    /// List decks
    Decks,
    /// Backfill catalog data and stamp the schema version
    Migrate {
        #[arg(long)]
        deck: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = InventoryConfig::new(&cli.root)
        .with_backup(!cli.no_backup)
        .with_catalog_dir(cli.catalog.clone());
    let inventory = Inventory::new(config);

    match cli.command {
        Command::Add { scan, deck } => run_add(&inventory, &scan, deck.as_deref()),
        Command::Move { scan, deck } => run_move(&inventory, &scan, &deck, true),
        Command::Return { scan, deck } => run_move(&inventory, &scan, &deck, false),
        Command::NewDeck { name } => run_new_deck(&inventory, &name),
        Command::Decks => run_decks(&inventory),
        Command::Migrate { deck } => run_migrate(&inventory, deck.as_deref()),
    }
}

/// Logs go to stderr so summaries on stdout stay clean.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_catalog(inventory: &Inventory) -> Option<LocalCatalog> {
    inventory.config().catalog_dir.as_ref().map(LocalCatalog::new)
}

fn run_add(inventory: &Inventory, scan: &Path, deck: Option<&str>) -> Result<()> {
    let target = target_for(deck);
    println!("📥 Adding scan to {}", target);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let cards = load_scan(scan, &inventory.config().format)?;
    println!("✓ Loaded {} scanned entries ({} copies)", cards.len(), total_quantity(&cards));

    let catalog = open_catalog(inventory);
    let lookup = catalog.as_ref().map(|c| c as &dyn CatalogLookup);
    let summary = inventory.add(cards, &target, lookup, &mut LogProgress, Utc::now())?;

    if summary.created {
        println!("✓ Created {}", summary.path.display());
    }
    if lookup.is_some() {
        println!("🔍 Catalog: {} fetched, {} unavailable", summary.fetched, summary.fetch_failed);
    }
    println!("✓ {} merged, {} new rows, {} copies added", summary.merged, summary.appended, summary.copies_added);
    println!("✓ {} now holds {} copies", target, summary.total_copies);
    if let Some(backup) = &summary.backup {
        println!("💾 Backup: {}", backup.display());
    }
    println!("✅ Saved {}", summary.path.display());
    Ok(())
}

fn run_move(inventory: &Inventory, scan: &Path, deck: &str, to_deck: bool) -> Result<()> {
    if to_deck {
        println!("➡️  Moving scan from collection to deck '{}'", deck);
    } else {
        println!("⬅️  Returning scan from deck '{}' to collection", deck);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let cards = load_scan(scan, &inventory.config().format)?;
    let summary = if to_deck {
        inventory.move_to_deck(deck, cards, Utc::now())?
    } else {
        inventory.return_from_deck(deck, cards, Utc::now())?
    };

    println!("✓ Moved {} copies", summary.moved);
    if !summary.missing.is_empty() {
        println!("⚠️  {} scanned copies not found in {}:", summary.missing.len(), summary.from.display());
        for card in &summary.missing {
            println!("   - {}", card);
        }
    }
    for backup in &summary.backups {
        println!("💾 Backup: {}", backup.display());
    }
    println!("✅ Saved {} and {}", summary.from.display(), summary.to.display());
    Ok(())
}

fn run_new_deck(inventory: &Inventory, name: &str) -> Result<()> {
    ensure_root(inventory.config())?;
    let path = inventory.create_deck(name, Utc::now())?;
    println!("✅ Created deck '{}' at {}", name, path.display());
    Ok(())
}

fn run_decks(inventory: &Inventory) -> Result<()> {
    let decks = inventory.list_decks()?;
    if decks.is_empty() {
        println!("📭 No decks in {}", inventory.deck_dir().display());
        return Ok(());
    }

    println!("🃏 Decks ({})", decks.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for deck in decks {
        println!("  {}", deck);
    }
    Ok(())
}

fn run_migrate(inventory: &Inventory, deck: Option<&str>) -> Result<()> {
    let target: Target = target_for(deck);
    let catalog = open_catalog(inventory).context("migrate needs a catalog mirror (--catalog <dir>)")?;

    println!("🔧 Migrating {}", target);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let summary = inventory.migrate(&target, &catalog, &mut LogProgress, Utc::now())?;

    println!("✓ Backfilled {} rows ({} still uncached)", summary.backfilled, summary.still_uncached);
    if summary.stamped {
        println!("✓ Stamped schema version");
    }
    if let Some(backup) = &summary.backup {
        println!("💾 Backup: {}", backup.display());
    }
    println!("✅ Saved {}", summary.path.display());
    Ok(())
}
