//! The dedupe-poll loop.
//!
//! Each tick reads the newest link from a [`LinkSource`], drops it if it is
//! malformed or already in the [`Ledger`], and otherwise records it, persists
//! the ledger and hands it to a [`Submitter`]. A failed submission is not
//! rolled back: the link stays recorded and is never attempted again unless an
//! operator forgets it.

use crate::{Ledger, LedgerStore, LinkSource, Submitter, is_valid_link};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Floor for the tick period; `tokio::time::interval` rejects zero
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Consecutive unhealthy cycles before warnings become errors
pub const DEFAULT_ESCALATE_AFTER: u32 = 3;

/// What a single poll cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The source call failed; nothing changed
    SourceUnavailable,
    /// The source returned no rows
    NoRows,
    /// The newest value does not look like a link
    Invalid(String),
    /// The newest link is already in the ledger
    AlreadyRecorded(String),
    /// A new link was recorded and handed to the submitter
    Submitted { link: String, succeeded: bool },
}

/// Counts back-to-back failures so a persistent breakage gets louder
#[derive(Debug)]
struct FailureStreak {
    count: u32,
    threshold: u32,
}

impl FailureStreak {
    fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold: threshold.max(1),
        }
    }

    fn is_escalated(&self) -> bool {
        self.count >= self.threshold
    }

    fn fail(&mut self, what: &str) {
        self.count += 1;
        if self.is_escalated() {
            tracing::error!(consecutive_failures = self.count, "{}", what);
        } else {
            tracing::warn!(consecutive_failures = self.count, "{}", what);
        }
    }

    /// Reset the streak. Returns `true` if it had escalated.
    fn recover(&mut self) -> bool {
        let escalated = self.is_escalated();
        if escalated {
            tracing::info!(
                "Recovered after {} consecutive failed cycles",
                self.count
            );
        }
        self.count = 0;
        escalated
    }
}

pub struct Poller<S, T> {
    source: S,
    submitter: T,
    ledger: Ledger,
    store: LedgerStore,
    failures: FailureStreak,
}

impl<S: LinkSource, T: Submitter> Poller<S, T> {
    pub fn new(source: S, submitter: T, ledger: Ledger, store: LedgerStore) -> Self {
        Self {
            source,
            submitter,
            ledger,
            store,
            failures: FailureStreak::new(DEFAULT_ESCALATE_AFTER),
        }
    }

    /// Change how many consecutive failures it takes to log at error level
    pub fn with_escalation_threshold(mut self, threshold: u32) -> Self {
        self.failures = FailureStreak::new(threshold);
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn submitter(&self) -> &T {
        &self.submitter
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of back-to-back unhealthy cycles so far
    /// Whether failures are currently logged at `error`
    pub fn is_escalated(&self) -> bool {
        self.failures.is_escalated()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures.count
    }

    /// Run one poll cycle. Never fails; every problem becomes an outcome and a log line.
    pub async fn tick(&mut self) -> TickOutcome {
        let link = match self.source.fetch_latest_link().await {
            Ok(Some(link)) => link,
            Ok(None) => {
                tracing::info!("No links found in source");
                self.failures.recover();
                return TickOutcome::NoRows;
            }
            Err(e) => {
                self.failures
                    .fail(&format!("Skipping cycle, could not read links: {}", e));
                return TickOutcome::SourceUnavailable;
            }
        };

        tracing::info!("Latest link found: {}", link);

        if !is_valid_link(&link) {
            tracing::warn!("Discarding latest value, not a valid link: {:?}", link);
            self.failures.recover();
            return TickOutcome::Invalid(link);
        }

        if self.ledger.contains(&link) {
            tracing::info!("Latest link already processed, nothing to submit");
            self.failures.recover();
            return TickOutcome::AlreadyRecorded(link);
        }

        tracing::info!("New valid link detected: {}", link);
        self.ledger.record(&link);
        // Persist before the runner starts: the operator login wait can be long.
        if let Err(e) = self.store.save(&self.ledger) {
            tracing::error!(
                "Failed to persist ledger to {}: {}",
                self.store.path().display(),
                e
            );
        }

        let succeeded = match self.submitter.submit(&link).await {
            Ok(()) => {
                tracing::info!("Submitted {}", link);
                self.failures.recover();
                true
            }
            Err(e) => {
                self.failures.fail(&format!(
                    "Submission of {} failed, link stays recorded: {}",
                    link, e
                ));
                false
            }
        };

        TickOutcome::Submitted { link, succeeded }
    }

    /// Tick immediately, then every `period`, until `shutdown` resolves.
    ///
    /// Ticks run back to back on this task, so a slow submission delays the
    /// next tick instead of overlapping it. Missed ticks are skipped. Shutdown
    /// is only observed between ticks; a submission in progress is finished.
    pub async fn run<F>(&mut self, period: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            "Polling for new links every {}s ({} already processed)",
            period.as_secs(),
            self.ledger.len()
        );

        if period.is_zero() {
            tracing::warn!("Poll interval of zero requested, using {:?}", MIN_POLL_INTERVAL);
        }
        let mut interval = tokio::time::interval(period.max(MIN_POLL_INTERVAL));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping poll loop");
                    break;
                }
                _ = interval.tick() => {}
            }
            self.tick().await;
        }
    }
}
