use anyhow::{Result, bail};
use console::style;
use linkpost_core::Config;

/// Open the portal, sign in if the session has expired, and save the session
pub fn execute(config: &Config) -> Result<()> {
    if config.browser.headless {
        bail!("Login needs a visible browser window; drop --headless");
    }

    let runner = crate::build_runner(config, crate::pick_operator())?;
    let report = super::runtime()?.block_on(runner.login());
    super::print_report(&report);

    if report.succeeded() {
        println!(
            "{} Session saved to {}",
            style("✓").green(),
            config.session_path().display()
        );
        Ok(())
    } else {
        bail!("Login failed")
    }
}
