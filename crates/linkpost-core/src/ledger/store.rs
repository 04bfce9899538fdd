use super::Ledger;
use crate::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Loads and saves the ledger file
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted ledger.
    ///
    /// A missing or unreadable file yields an empty ledger; both happen on a
    /// normal first start and neither stops the process.
    pub fn load(&self) -> Ledger {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(
                    "No ledger at {}, starting with an empty ledger",
                    self.path.display()
                );
                return Ledger::new();
            }
            Err(e) => {
                tracing::warn!(
                    "Could not read ledger at {} ({}), starting with an empty ledger",
                    self.path.display(),
                    e
                );
                return Ledger::new();
            }
        };

        match serde_json::from_str::<Ledger>(&content) {
            Ok(ledger) => {
                tracing::debug!(
                    "Loaded ledger with {} links from {}",
                    ledger.len(),
                    self.path.display()
                );
                ledger
            }
            Err(e) => {
                tracing::warn!(
                    "Ledger at {} is corrupt ({}), starting with an empty ledger",
                    self.path.display(),
                    e
                );
                Ledger::new()
            }
        }
    }

    /// Overwrite the ledger file with the full ledger.
    ///
    /// The new content is written to a sibling temp file and renamed over the
    /// target, so a reader never observes a half-written ledger.
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, ledger)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!(
            "Saved ledger with {} links to {}",
            ledger.len(),
            self.path.display()
        );
        Ok(())
    }
}
