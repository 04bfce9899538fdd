use std::time::Duration;

/// Channel for telling a human that the run is waiting on them
pub trait Operator: Send + Sync {
    /// The one-time code prompt is on screen and the run is suspended
    fn otp_requested(&self, account: &str, timeout: Duration);

    /// The suspension ended, either signed in or not
    fn otp_finished(&self, signed_in: bool);
}

/// Reports operator prompts through the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOperator;

impl Operator for LogOperator {
    fn otp_requested(&self, account: &str, timeout: Duration) {
        tracing::warn!(
            "Session expired: enter the one-time code sent to {} in the browser window (waiting up to {}s)",
            account,
            timeout.as_secs()
        );
    }

    fn otp_finished(&self, signed_in: bool) {
        if signed_in {
            tracing::info!("Signed in, continuing");
        } else {
            tracing::error!("No one-time code was entered in time");
        }
    }
}
