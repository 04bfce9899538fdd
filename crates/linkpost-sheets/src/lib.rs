//! Reads candidate links from a Google Sheets column.

mod client;
mod credentials;
mod error;
mod token;

pub use client::{SheetsClient, ValueRange, latest_link};
pub use credentials::{SHEETS_READONLY_SCOPE, ServiceAccountKey};
pub use error::{Error, Result};
pub use token::TokenProvider;
