//! Ledger maintenance.
//!
//! A link that failed to submit stays in the ledger and is never retried;
//! `forget` is how an operator puts it back in play.
//!
//! ```bash
//! linkpost ledger show
//! linkpost ledger forget https://example.com/post/1
//! linkpost ledger clear --force
//! ```

use anyhow::{Result, anyhow};
use console::style;
use linkpost_core::{Config, LedgerStore};
use std::io::{self, Write};

/// List processed links
pub fn show(config: &Config, json: bool) -> Result<()> {
    let store = LedgerStore::new(config.ledger_path());
    let ledger = store.load();

    if json {
        println!("{}", serde_json::to_string_pretty(&ledger)?);
        return Ok(());
    }

    if ledger.is_empty() {
        println!("No links processed yet ({})", store.path().display());
        return Ok(());
    }

    println!(
        "{} ({} links)",
        style(store.path().display()).bold(),
        ledger.len()
    );
    if let Some(last) = ledger.last() {
        println!("Last processed: {}", style(last).cyan());
    }
    println!();
    for link in ledger.iter() {
        println!("  {}", link);
    }

    Ok(())
}

/// Remove one link so the next poll can submit it again
pub fn forget(config: &Config, link: &str) -> Result<()> {
    let store = LedgerStore::new(config.ledger_path());
    let mut ledger = store.load();

    if !ledger.forget(link.trim()) {
        return Err(anyhow!("'{}' is not in the ledger", link.trim()));
    }

    store.save(&ledger)?;
    println!("{} Forgot {}", style("✓").green(), link.trim());
    Ok(())
}

/// Empty the ledger
pub fn clear(config: &Config, force: bool) -> Result<()> {
    let store = LedgerStore::new(config.ledger_path());
    let mut ledger = store.load();

    if ledger.is_empty() {
        println!("Ledger is already empty.");
        return Ok(());
    }

    // Every link in the sheet becomes eligible again, so require confirmation
    if !force {
        print!(
            "This will forget {} processed links. Type 'clear' to confirm: ",
            ledger.len()
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if input.trim() != "clear" {
            println!("Clear cancelled.");
            return Ok(());
        }
    }

    let count = ledger.len();
    ledger.clear();
    store.save(&ledger)?;
    println!("{} Cleared {} links", style("✓").green(), count);
    Ok(())
}
