use anyhow::Result;
use clap::Args;
use linkpost_browser::{
    AutomationRunner, ChromeFinder, ChromeLauncher, CreatorPortal, LogOperator, Operator,
    SessionStore,
};
use linkpost_core::Config;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod commands;
pub mod operator;

pub use operator::TerminalOperator;

/// Command-line and environment overrides for individual config fields
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Spreadsheet to poll
    #[arg(long, global = true, env = "LINKPOST_SPREADSHEET_ID")]
    pub spreadsheet_id: Option<String>,

    /// Service-account key file for the Sheets API
    #[arg(long, global = true, env = "LINKPOST_CREDENTIALS", value_name = "FILE")]
    pub credentials: Option<PathBuf>,

    /// Creator portal account used when the session has expired
    #[arg(long, global = true, env = "LINKPOST_ACCOUNT_EMAIL")]
    pub account_email: Option<String>,

    /// Path to the Chrome binary
    #[arg(long, global = true, value_name = "PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Run Chrome without a window (login will not be possible)
    #[arg(long, global = true)]
    pub headless: bool,

    /// Directory for the ledger and session files
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref id) = self.spreadsheet_id {
            config.source.spreadsheet_id = Some(id.clone());
        }
        if let Some(ref path) = self.credentials {
            config.source.credentials = Some(path.clone());
        }
        if let Some(ref email) = self.account_email {
            config.target.account_email = Some(email.clone());
        }
        if let Some(ref path) = self.chrome_path {
            config.browser.chrome_path = Some(path.clone());
        }
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(ref dir) = self.state_dir {
            config.state.dir = Some(dir.clone());
        }
    }
}

/// Load the config file, layer the overrides on top and check the result
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<Config> {
    let mut config = Config::load(path)?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Spinner on a terminal, plain log lines otherwise
pub fn pick_operator() -> Arc<dyn Operator> {
    if console::Term::stdout().is_term() {
        Arc::new(TerminalOperator::new())
    } else {
        Arc::new(LogOperator)
    }
}

/// Wire the Chrome launcher and portal adapter from the config
pub fn build_runner(
    config: &Config,
    operator: Arc<dyn Operator>,
) -> Result<AutomationRunner<ChromeLauncher, CreatorPortal>> {
    let account_email = config.validate_target()?;
    let chrome = ChromeFinder::new(config.browser.chrome_path.clone()).find()?;
    if config.browser.headless {
        tracing::warn!("Running headless; an expired session cannot be renewed");
    }

    let portal = CreatorPortal::new(
        config.target.url.as_str(),
        account_email,
        config.step_timeout(),
        config.otp_timeout(),
    );

    Ok(AutomationRunner::new(
        ChromeLauncher::new(chrome, config.browser.headless),
        portal,
        SessionStore::new(config.session_path()),
        operator,
    ))
}
