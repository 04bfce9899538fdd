use anyhow::{Result, bail};
use console::style;
use linkpost_browser::RunState;
use linkpost_core::{Config, LedgerStore, is_valid_link};

/// Submit a single link without consulting the spreadsheet
pub fn execute(config: &Config, link: &str, record: bool) -> Result<()> {
    let link = link.trim();
    if !is_valid_link(link) {
        bail!("'{}' does not look like a link", link);
    }

    let runner = crate::build_runner(config, crate::pick_operator())?;

    if record {
        let store = LedgerStore::new(config.ledger_path());
        let mut ledger = store.load();
        if ledger.contains(link) {
            println!("{} Already in the ledger, submitting anyway", style("!").yellow());
        }
        ledger.record(link);
        store.save(&ledger)?;
    }

    println!("Submitting {}", style(link).cyan());
    let report = super::runtime()?.block_on(runner.run(link));
    super::print_report(&report);

    if report.reached(RunState::Submitted) {
        println!("{} Submitted {}", style("✓").green(), link);
        Ok(())
    } else {
        bail!("Submission failed")
    }
}
