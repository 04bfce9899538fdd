use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Link source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Automation step failed: {0}")]
    AutomationStepFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
