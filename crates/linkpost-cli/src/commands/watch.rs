use anyhow::{Result, bail};
use console::style;
use linkpost_core::{Config, LedgerStore, Poller, TickOutcome};
use linkpost_sheets::SheetsClient;

/// Poll the spreadsheet, either once or until Ctrl-C
pub fn execute(config: &Config, once: bool) -> Result<()> {
    config.validate_source()?;
    let runner = crate::build_runner(config, crate::pick_operator())?;
    let source = SheetsClient::from_settings(&config.source)?;

    let store = LedgerStore::new(config.ledger_path());
    let ledger = store.load();

    let runtime = super::runtime()?;
    runtime.block_on(async {
        let mut poller = Poller::new(source, runner, ledger, store)
            .with_escalation_threshold(config.poll.escalate_after);

        if once {
            let outcome = poller.tick().await;
            print_outcome(&outcome);
            return match outcome {
                TickOutcome::SourceUnavailable => bail!("Could not read the spreadsheet"),
                TickOutcome::Submitted {
                    succeeded: false, ..
                } => bail!("Submission failed; the link stays recorded"),
                _ => Ok(()),
            };
        }

        println!(
            "Watching spreadsheet every {}s. Press Ctrl-C to stop.",
            config.poll.interval_secs
        );
        poller.run(config.poll_interval(), shutdown_signal()).await;
        Ok(())
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn print_outcome(outcome: &TickOutcome) {
    match outcome {
        TickOutcome::SourceUnavailable => {
            println!("{} Spreadsheet unavailable", style("✗").red())
        }
        TickOutcome::NoRows => println!("No links in the spreadsheet yet"),
        TickOutcome::Invalid(value) => {
            println!("{} Newest row is not a link: {}", style("!").yellow(), value)
        }
        TickOutcome::AlreadyRecorded(link) => println!("Already processed: {}", link),
        TickOutcome::Submitted {
            link,
            succeeded: true,
        } => println!("{} Submitted {}", style("✓").green(), link),
        TickOutcome::Submitted {
            link,
            succeeded: false,
        } => println!("{} Failed to submit {}", style("✗").red(), link),
    }
}
