use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read credentials file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid credentials: {0}")]
    Credentials(String),

    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to sign token request: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid API URL {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

impl From<Error> for linkpost_core::Error {
    fn from(err: Error) -> Self {
        linkpost_core::Error::SourceUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
