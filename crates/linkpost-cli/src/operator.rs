use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use linkpost_browser::Operator;
use std::sync::Mutex;
use std::time::Duration;

/// Prompts the person at the terminal and shows a spinner while the run waits
#[derive(Default)]
pub struct TerminalOperator {
    spinner: Mutex<Option<ProgressBar>>,
}

impl TerminalOperator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Operator for TerminalOperator {
    fn otp_requested(&self, account: &str, timeout: Duration) {
        tracing::warn!("Session expired, waiting for one-time code for {}", account);

        println!();
        println!("{}", style("Action required").yellow().bold());
        println!(
            "  Enter the one-time code sent to {} in the browser window.",
            style(account).cyan()
        );

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.yellow} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!(
            "Waiting for sign-in (up to {}s)",
            timeout.as_secs()
        ));
        spinner.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(spinner);
        }
    }

    fn otp_finished(&self, signed_in: bool) {
        if let Some(spinner) = self.spinner.lock().ok().and_then(|mut slot| slot.take()) {
            spinner.finish_and_clear();
        }

        if signed_in {
            println!("{} Signed in", style("✓").green());
        } else {
            println!(
                "{} No code entered in time, giving up on this run",
                style("✗").red()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_clears_spinner() {
        let operator = TerminalOperator::new();
        operator.otp_requested("creator@example.com", Duration::from_secs(5));
        assert!(operator.spinner.lock().unwrap().is_some());

        operator.otp_finished(true);
        assert!(operator.spinner.lock().unwrap().is_none());
    }

    #[test]
    fn test_finish_without_request_is_harmless() {
        let operator = TerminalOperator::new();
        operator.otp_finished(false);
        assert!(operator.spinner.lock().unwrap().is_none());
    }
}
