pub mod config;
pub mod error;
pub mod ledger;
pub mod link;
pub mod poll;
pub mod source;

pub use config::Config;
pub use error::{Error, Result};
pub use ledger::{Ledger, LedgerStore};
pub use link::is_valid_link;
pub use poll::{Poller, TickOutcome};
pub use source::{LinkSource, Submitter};
