//! Runtime configuration.
//!
//! Settings come from an optional TOML file. Every section and field has a
//! default, so an empty file (or no file) is valid; the CLI layers flag and
//! environment overrides on top before calling [`Config::validate_source`].
//!
//! ```toml
//! [source]
//! spreadsheet_id = "13bc..."
//! credentials = "/etc/linkpost/credentials.json"
//!
//! [target]
//! account_email = "creator@example.com"
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_RANGE: &str = "Form Responses 1!A2:A";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_TARGET_URL: &str = "https://creator.rizz.app";
pub const LEDGER_FILE: &str = "processed_links.json";
pub const SESSION_FILE: &str = "state.json";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceSettings,
    pub target: TargetSettings,
    pub browser: BrowserSettings,
    pub state: StateSettings,
    pub poll: PollSettings,
}

/// Where links are read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub spreadsheet_id: Option<String>,
    /// A1 range covering the link column, header row excluded
    pub range: String,
    /// Service-account key file used to authenticate against the sheet
    pub credentials: Option<PathBuf>,
    pub api_base: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            range: DEFAULT_RANGE.to_string(),
            credentials: None,
            api_base: DEFAULT_SHEETS_API_BASE.to_string(),
        }
    }
}

/// The web application links are submitted to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSettings {
    pub url: String,
    /// Account used when the saved session has expired
    pub account_email: Option<String>,
    pub step_timeout_secs: u64,
    /// How long to wait for an operator to enter the one-time code
    pub otp_timeout_secs: u64,
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_TARGET_URL.to_string(),
            account_email: None,
            step_timeout_secs: 20,
            otp_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSettings {
    /// Directory holding the ledger and session files (default `~/.linkpost`)
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_secs: u64,
    pub escalate_after: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: crate::poll::DEFAULT_POLL_INTERVAL.as_secs(),
            escalate_after: crate::poll::DEFAULT_ESCALATE_AFTER,
        }
    }
}

impl Config {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("Reading config from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `~/.linkpost/config.toml` is
    /// used if present, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match default_state_dir().map(|dir| dir.join(CONFIG_FILE)) {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Directory for the ledger and session files
    pub fn state_dir(&self) -> PathBuf {
        self.state
            .dir
            .clone()
            .or_else(default_state_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.state_dir().join(LEDGER_FILE)
    }

    pub fn session_path(&self) -> PathBuf {
        self.state_dir().join(SESSION_FILE)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.target.step_timeout_secs)
    }

    pub fn otp_timeout(&self) -> Duration {
        Duration::from_secs(self.target.otp_timeout_secs)
    }

    /// Check the settings every command relies on
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.target.url).map_err(|e| {
            Error::InvalidConfig(format!("target.url '{}' is not a URL: {}", self.target.url, e))
        })?;
        if self.poll.interval_secs == 0 {
            return Err(Error::InvalidConfig(
                "poll.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.target.step_timeout_secs == 0 || self.target.otp_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "target timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Check the settings needed to read the spreadsheet
    pub fn validate_source(&self) -> Result<()> {
        self.validate()?;
        if self.source.spreadsheet_id.as_deref().is_none_or(str::is_empty) {
            return Err(Error::InvalidConfig(
                "source.spreadsheet_id is not set (use --spreadsheet-id or LINKPOST_SPREADSHEET_ID)"
                    .to_string(),
            ));
        }
        if self.source.credentials.is_none() {
            return Err(Error::InvalidConfig(
                "source.credentials is not set (use --credentials or LINKPOST_CREDENTIALS)"
                    .to_string(),
            ));
        }
        Url::parse(&self.source.api_base).map_err(|e| {
            Error::InvalidConfig(format!(
                "source.api_base '{}' is not a URL: {}",
                self.source.api_base, e
            ))
        })?;
        Ok(())
    }

    /// Check the settings needed to sign in to the target, returning the account
    pub fn validate_target(&self) -> Result<&str> {
        self.validate()?;
        match self.target.account_email.as_deref() {
            Some(email) if email.contains('@') => Ok(email),
            Some(email) => Err(Error::InvalidConfig(format!(
                "target.account_email '{}' is not an email address",
                email
            ))),
            None => Err(Error::InvalidConfig(
                "target.account_email is not set (use --account-email or LINKPOST_ACCOUNT_EMAIL)"
                    .to_string(),
            )),
        }
    }
}

/// `~/.linkpost`, when a home directory is known
pub fn default_state_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".linkpost"))
}
