use crate::Result;
use async_trait::async_trait;

/// Something that can report the newest submitted link
#[async_trait]
pub trait LinkSource: Send + Sync {
    /// Return the latest candidate link, or `None` when the source has no rows.
    ///
    /// Failures should surface as [`crate::Error::SourceUnavailable`].
    async fn fetch_latest_link(&self) -> Result<Option<String>>;
}

/// Something that pushes one link into the target application
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, link: &str) -> Result<()>;
}
