//! Browser automation that submits links to the creator portal.

mod adapter;
mod chrome_finder;
mod error;
mod launcher;
mod locator;
mod operator;
mod profile;
mod runner;
mod session;
mod surface;

#[cfg(test)]
mod testing;

pub use adapter::{CreatorPortal, TargetApp};
pub use chrome_finder::ChromeFinder;
pub use error::{Error, Result};
pub use launcher::ChromeLauncher;
pub use locator::Locator;
pub use operator::{LogOperator, Operator};
pub use profile::ScratchProfile;
pub use runner::{AutomationRunner, RunReport, RunState, StepFailure};
pub use session::{OriginStorage, SessionState, SessionStore, StorageEntry, StoredCookie};
pub use surface::{ChromeSurface, Launch, Surface, WAIT_POLL_INTERVAL};
