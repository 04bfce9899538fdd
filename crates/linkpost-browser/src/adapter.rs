//! Everything that knows what the target application looks like.
//!
//! The runner only sees [`TargetApp`]; selectors and step order for the
//! creator portal live in [`CreatorPortal`]. When the portal's layout changes,
//! this is the file to touch.

use crate::{Error, Locator, Operator, Result, Surface};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Steps of the submission script, one method per state transition
#[async_trait]
pub trait TargetApp: Send + Sync {
    async fn open_landing_page(&self, surface: &dyn Surface) -> Result<()>;

    /// Whether the landing page is asking us to sign in
    async fn is_login_required(&self, surface: &dyn Surface) -> Result<bool>;

    /// Sign in, suspending until the operator completes the one-time code
    async fn log_in(&self, surface: &dyn Surface, operator: &dyn Operator) -> Result<()>;

    async fn navigate_to_campaigns(&self, surface: &dyn Surface) -> Result<()>;

    async fn open_post_modal(&self, surface: &dyn Surface) -> Result<()>;

    async fn enter_link(&self, surface: &dyn Surface, link: &str) -> Result<()>;

    async fn submit_post(&self, surface: &dyn Surface) -> Result<()>;
}

const POSTED_HEADER: &str = "div.tss-1akey0g-MUIDataTableHeadCell-data";
const EMAIL_INPUT: &str = "input#email";
const OTP_INPUT: &str = r#"input[type="text"][maxlength="6"]"#;
const SUBMIT_POST_BUTTON: &str = r"#root > div > div > div > div > div:nth-child(15) > div.flex.justify-between.flex-col.md\:flex-row.items-start.gap-4 > div.flex.flex-col.md\:flex-row.w-full.md\:w-fit.items-center.md\:self-center.gap-4.pt-2.md\:pt-0 > div.md\:text-nowrap.w-full.md\:w-fit > button";
const LINK_INPUT: &str = r#"input[type="url"]"#;
const MODAL_SUBMIT_BUTTON: &str = "body > div.ReactModalPortal > div > div > div > div.text-white.p-4.w-full.border-t-2.text-center.mt-6 > form > button";

/// The creator portal's campaign submission flow
#[derive(Debug, Clone)]
pub struct CreatorPortal {
    url: String,
    account_email: String,
    step_timeout: Duration,
    otp_timeout: Duration,
}

impl CreatorPortal {
    pub fn new(
        url: impl Into<String>,
        account_email: impl Into<String>,
        step_timeout: Duration,
        otp_timeout: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            account_email: account_email.into(),
            step_timeout,
            otp_timeout,
        }
    }

    pub(crate) fn join_now() -> Locator {
        Locator::text("button", "Join Now")
    }

    pub(crate) fn posted_header() -> Locator {
        Locator::css(POSTED_HEADER)
    }

    pub(crate) fn email_input() -> Locator {
        Locator::css(EMAIL_INPUT)
    }

    pub(crate) fn continue_button() -> Locator {
        Locator::text("button", "Continue")
    }

    pub(crate) fn otp_input() -> Locator {
        Locator::css(OTP_INPUT)
    }

    /// The header button labelled with the signed-in account
    pub(crate) fn account_menu(&self) -> Locator {
        Locator::text("button", self.account_email.as_str())
    }

    pub(crate) fn campaigns_button() -> Locator {
        Locator::text("button", "Campaigns")
    }

    pub(crate) fn campaigns_item() -> Locator {
        Locator::text("li", "Campaigns")
    }

    pub(crate) fn submit_post_button() -> Locator {
        Locator::css(SUBMIT_POST_BUTTON)
    }

    pub(crate) fn link_input() -> Locator {
        Locator::css(LINK_INPUT)
    }

    pub(crate) fn modal_submit_button() -> Locator {
        Locator::css(MODAL_SUBMIT_BUTTON)
    }

    /// `Some(true)` for the sign-up page, `Some(false)` for the dashboard,
    /// `None` while neither has rendered
    async fn landing_face(&self, surface: &dyn Surface) -> Result<Option<bool>> {
        if surface.is_visible(&Self::join_now()).await? {
            return Ok(Some(true));
        }
        if surface.is_visible(&Self::posted_header()).await?
            || surface.is_visible(&self.account_menu()).await?
        {
            return Ok(Some(false));
        }
        Ok(None)
    }

    async fn click_when_ready(&self, surface: &dyn Surface, locator: &Locator) -> Result<()> {
        surface.wait_for(locator, self.step_timeout).await?;
        surface.click(locator).await
    }
}

#[async_trait]
impl TargetApp for CreatorPortal {
    async fn open_landing_page(&self, surface: &dyn Surface) -> Result<()> {
        surface.goto(&self.url).await
    }

    async fn is_login_required(&self, surface: &dyn Surface) -> Result<bool> {
        // The dashboard renders client-side; wait until it shows either face.
        let deadline = Instant::now() + self.step_timeout;
        let mut last_error = None;
        loop {
            match self.landing_face(surface).await {
                Ok(Some(login_required)) => return Ok(login_required),
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!("Landing page check failed, retrying: {}", e);
                    last_error = Some(e.to_string());
                }
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout {
                    what: "landing page to render".to_string(),
                    after: self.step_timeout,
                    last_error,
                });
            }
            tokio::time::sleep(crate::surface::WAIT_POLL_INTERVAL).await;
        }
    }

    async fn log_in(&self, surface: &dyn Surface, operator: &dyn Operator) -> Result<()> {
        self.click_when_ready(surface, &Self::join_now()).await?;

        let email = Self::email_input();
        surface.wait_for(&email, self.step_timeout).await?;
        surface.fill(&email, &self.account_email).await?;
        self.click_when_ready(surface, &Self::continue_button()).await?;

        surface.wait_for(&Self::otp_input(), self.step_timeout).await?;
        operator.otp_requested(&self.account_email, self.otp_timeout);

        let signed_in = surface
            .wait_for(&self.account_menu(), self.otp_timeout)
            .await;
        operator.otp_finished(signed_in.is_ok());
        signed_in
    }

    async fn navigate_to_campaigns(&self, surface: &dyn Surface) -> Result<()> {
        // Clicking the table header takes focus off the search bar.
        self.click_when_ready(surface, &Self::posted_header()).await?;
        self.click_when_ready(surface, &self.account_menu()).await?;
        self.click_when_ready(surface, &Self::campaigns_button()).await?;
        self.click_when_ready(surface, &Self::campaigns_item()).await
    }

    async fn open_post_modal(&self, surface: &dyn Surface) -> Result<()> {
        self.click_when_ready(surface, &Self::submit_post_button()).await?;
        surface.wait_for(&Self::link_input(), self.step_timeout).await
    }

    async fn enter_link(&self, surface: &dyn Surface, link: &str) -> Result<()> {
        surface.fill(&Self::link_input(), link).await
    }

    async fn submit_post(&self, surface: &dyn Surface) -> Result<()> {
        self.click_when_ready(surface, &Self::modal_submit_button())
            .await
    }
}
