pub mod completion;
pub mod ledger;
pub mod login;
pub mod session;
pub mod submit;
pub mod watch;

use anyhow::Result;
use console::style;
use linkpost_browser::{RunReport, RunState};

/// Runtime for commands that talk to the network or the browser
fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// Print the states an automation run went through
fn print_report(report: &RunReport) {
    for state in &report.states {
        if *state == RunState::NotStarted {
            continue;
        }
        println!("  {} {}", style("•").dim(), state);
    }

    if let Some(ref failure) = report.failure {
        println!("{} {}", style("✗").red().bold(), failure);
    }
}
