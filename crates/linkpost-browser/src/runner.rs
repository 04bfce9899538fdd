//! Drives one link through the target application.
//!
//! A run walks a fixed script:
//!
//! ```text
//! NotStarted -> SessionLoaded -> LoginRequired -> LoggedIn ----\
//!                             \-> SessionValid ----------------+-> NavigatedToCampaigns
//!   -> PostModalOpen -> LinkEntered -> Submitted -> SessionSaved -> Closed
//! ```
//!
//! Any failure stops the script where it is and jumps to `Closed`. The browser
//! is closed on every path.

use crate::session::SessionStore;
use crate::{Launch, Operator, Result, Surface, TargetApp};
use async_trait::async_trait;
use chrono::Utc;
use linkpost_core::Submitter;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    SessionLoaded,
    LoginRequired,
    LoggedIn,
    SessionValid,
    NavigatedToCampaigns,
    PostModalOpen,
    LinkEntered,
    Submitted,
    SessionSaved,
    Closed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::NotStarted => "not started",
            RunState::SessionLoaded => "session loaded",
            RunState::LoginRequired => "login required",
            RunState::LoggedIn => "logged in",
            RunState::SessionValid => "session valid",
            RunState::NavigatedToCampaigns => "navigated to campaigns",
            RunState::PostModalOpen => "post modal open",
            RunState::LinkEntered => "link entered",
            RunState::Submitted => "submitted",
            RunState::SessionSaved => "session saved",
            RunState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Where a run stopped and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    /// Last state reached before the failing step
    pub state: RunState,
    pub message: String,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (after {})", self.message, self.state)
    }
}

/// Every state a run passed through, and its failure if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub states: Vec<RunState>,
    pub failure: Option<StepFailure>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            states: vec![RunState::NotStarted],
            failure: None,
        }
    }

    pub fn current(&self) -> RunState {
        self.states.last().copied().unwrap_or(RunState::NotStarted)
    }

    pub fn reached(&self, state: RunState) -> bool {
        self.states.contains(&state)
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    fn advance(&mut self, state: RunState) {
        tracing::debug!("Automation: {} -> {}", self.current(), state);
        self.states.push(state);
    }

    fn fail(&mut self, error: crate::Error) {
        let failure = StepFailure {
            state: self.current(),
            message: error.to_string(),
        };
        tracing::error!("Automation failed: {}", failure);
        self.failure = Some(failure);
    }
}

pub struct AutomationRunner<L, A> {
    launcher: L,
    app: A,
    sessions: SessionStore,
    operator: Arc<dyn Operator>,
}

impl<L: Launch, A: TargetApp> AutomationRunner<L, A> {
    pub fn new(launcher: L, app: A, sessions: SessionStore, operator: Arc<dyn Operator>) -> Self {
        Self {
            launcher,
            app,
            sessions,
            operator,
        }
    }

    /// Submit one link. Never panics or returns early; the report says what happened.
    pub async fn run(&self, link: &str) -> RunReport {
        tracing::info!("Starting automation for {}", link);
        let mut report = RunReport::new();

        let surface = match self.launcher.open().await {
            Ok(surface) => surface,
            Err(e) => {
                report.fail(e);
                return report;
            }
        };

        let result = self.submit_script(&surface, link, &mut report).await;
        self.finish(&surface, result, &mut report).await;
        report
    }

    /// Only establish a session: sign in if needed, then persist it
    pub async fn login(&self) -> RunReport {
        tracing::info!("Refreshing session");
        let mut report = RunReport::new();

        let surface = match self.launcher.open().await {
            Ok(surface) => surface,
            Err(e) => {
                report.fail(e);
                return report;
            }
        };

        let result = async {
            self.enter_session(&surface, &mut report).await?;
            self.save_session(&surface, &mut report).await
        }
        .await;
        self.finish(&surface, result, &mut report).await;
        report
    }

    async fn submit_script(
        &self,
        surface: &dyn Surface,
        link: &str,
        report: &mut RunReport,
    ) -> Result<()> {
        self.enter_session(surface, report).await?;

        self.app.navigate_to_campaigns(surface).await?;
        report.advance(RunState::NavigatedToCampaigns);

        self.app.open_post_modal(surface).await?;
        report.advance(RunState::PostModalOpen);

        self.app.enter_link(surface, link).await?;
        report.advance(RunState::LinkEntered);

        self.app.submit_post(surface).await?;
        report.advance(RunState::Submitted);
        tracing::info!("Post submitted: {}", link);

        self.save_session(surface, report).await
    }

    /// Restore the saved session, open the app and take the login branch if asked to
    async fn enter_session(&self, surface: &dyn Surface, report: &mut RunReport) -> Result<()> {
        let saved = self.sessions.load();
        if !saved.is_empty() {
            surface.import_session(&saved).await?;
        }
        report.advance(RunState::SessionLoaded);

        self.app.open_landing_page(surface).await?;
        if self.app.is_login_required(surface).await? {
            report.advance(RunState::LoginRequired);
            tracing::warn!("Session expired, logging in again");
            self.app.log_in(surface, self.operator.as_ref()).await?;
            report.advance(RunState::LoggedIn);
        } else {
            report.advance(RunState::SessionValid);
        }
        Ok(())
    }

    async fn save_session(&self, surface: &dyn Surface, report: &mut RunReport) -> Result<()> {
        let mut state = surface.export_session().await?;
        state.saved_at = Some(Utc::now());
        self.sessions.save(&state)?;
        report.advance(RunState::SessionSaved);
        tracing::info!("Session saved to {}", self.sessions.path().display());
        Ok(())
    }

    async fn finish(&self, surface: &dyn Surface, result: Result<()>, report: &mut RunReport) {
        if let Err(e) = result {
            report.fail(e);
        }
        if let Err(e) = surface.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        report.advance(RunState::Closed);
    }
}

#[async_trait]
impl<L: Launch, A: TargetApp> Submitter for AutomationRunner<L, A> {
    async fn submit(&self, link: &str) -> linkpost_core::Result<()> {
        let report = self.run(link).await;
        match report.failure {
            None => Ok(()),
            // The post went through; only the session refresh was lost.
            Some(failure) if report.states.contains(&RunState::Submitted) => {
                tracing::warn!("Submitted {} but could not save session: {}", link, failure);
                Ok(())
            }
            Some(failure) => Err(linkpost_core::Error::AutomationStepFailed(
                failure.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CreatorPortal;
    use crate::session::{SessionState, StoredCookie};
    use crate::testing::{RecordingOperator, ScriptedLauncher, ScriptedSurface};
    use std::time::Duration;

    fn portal() -> CreatorPortal {
        CreatorPortal::new(
            "https://creator.rizz.app",
            "creator@example.com",
            Duration::from_secs(5),
            Duration::from_secs(60),
        )
    }

    fn dashboard(surface: &ScriptedSurface, portal: &CreatorPortal) {
        surface.show_all(&[
            CreatorPortal::posted_header(),
            portal.account_menu(),
            CreatorPortal::campaigns_button(),
            CreatorPortal::campaigns_item(),
            CreatorPortal::submit_post_button(),
            CreatorPortal::link_input(),
            CreatorPortal::modal_submit_button(),
        ]);
    }

    fn session_cookie() -> SessionState {
        SessionState {
            cookies: vec![StoredCookie {
                name: "sid".to_string(),
                value: "abc".to_string(),
                domain: ".rizz.app".to_string(),
                path: "/".to_string(),
                expires: -1.0,
                http_only: true,
                secure: true,
                same_site: None,
            }],
            origins: vec![],
            saved_at: None,
        }
    }

    fn runner(
        surface: Arc<ScriptedSurface>,
        dir: &tempfile::TempDir,
    ) -> AutomationRunner<ScriptedLauncher, CreatorPortal> {
        AutomationRunner::new(
            ScriptedLauncher::new(surface),
            portal(),
            SessionStore::new(dir.path().join("state.json")),
            Arc::new(RecordingOperator::default()),
        )
    }

    #[tokio::test]
    async fn test_valid_session_runs_full_script() {
        let dir = tempfile::tempdir().unwrap();
        let surface = ScriptedSurface::new();
        dashboard(&surface, &portal());
        surface.set_session(session_cookie());

        let report = runner(surface.clone(), &dir).run("https://example.com/a").await;

        assert!(report.succeeded());
        assert_eq!(
            report.states,
            vec![
                RunState::NotStarted,
                RunState::SessionLoaded,
                RunState::SessionValid,
                RunState::NavigatedToCampaigns,
                RunState::PostModalOpen,
                RunState::LinkEntered,
                RunState::Submitted,
                RunState::SessionSaved,
                RunState::Closed,
            ]
        );
        assert!(surface.is_closed());
        assert_eq!(surface.actions()[0], "goto:https://creator.rizz.app");

        let saved = SessionStore::new(dir.path().join("state.json")).load();
        assert_eq!(saved.cookies, session_cookie().cookies);
        assert!(saved.saved_at.is_some());
    }

    #[tokio::test]
    async fn test_saved_session_is_restored_before_landing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("state.json"));
        store.save(&session_cookie()).unwrap();

        let surface = ScriptedSurface::new();
        dashboard(&surface, &portal());

        runner(surface.clone(), &dir).run("https://example.com/a").await;

        assert_eq!(surface.imported(), Some(session_cookie()));
    }

    #[tokio::test]
    async fn test_expired_session_takes_login_branch() {
        let dir = tempfile::tempdir().unwrap();
        let portal = portal();
        let surface = ScriptedSurface::new();
        dashboard(&surface, &portal);
        surface.show_all(&[
            CreatorPortal::join_now(),
            CreatorPortal::email_input(),
            CreatorPortal::continue_button(),
            CreatorPortal::otp_input(),
        ]);
        let operator = Arc::new(RecordingOperator::default());

        let runner = AutomationRunner::new(
            ScriptedLauncher::new(surface.clone()),
            portal,
            SessionStore::new(dir.path().join("state.json")),
            operator.clone(),
        );
        let report = runner.run("https://example.com/a").await;

        assert!(report.succeeded());
        assert!(report.reached(RunState::LoginRequired));
        assert!(report.reached(RunState::LoggedIn));
        assert!(!report.reached(RunState::SessionValid));
        assert_eq!(operator.events().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_step_still_closes_browser() {
        let dir = tempfile::tempdir().unwrap();
        let surface = ScriptedSurface::new();
        dashboard(&surface, &portal());
        surface.fail_on(format!("click:{}", CreatorPortal::modal_submit_button()));

        let runner = runner(surface.clone(), &dir);
        let report = runner.run("https://example.com/a").await;

        let failure = report.failure.clone().unwrap();
        assert_eq!(failure.state, RunState::LinkEntered);
        assert_eq!(report.current(), RunState::Closed);
        assert!(!report.reached(RunState::Submitted));
        assert!(surface.is_closed());
        assert!(!dir.path().join("state.json").exists());

        let err = runner.submit("https://example.com/a").await.unwrap_err();
        assert!(err.to_string().contains("after link entered"));
    }

    #[tokio::test]
    async fn test_launch_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let surface = ScriptedSurface::new();
        let mut launcher = ScriptedLauncher::new(surface.clone());
        launcher.fail = true;

        let runner = AutomationRunner::new(
            launcher,
            portal(),
            SessionStore::new(dir.path().join("state.json")),
            Arc::new(RecordingOperator::default()),
        );
        let report = runner.run("https://example.com/a").await;

        assert_eq!(report.failure.unwrap().state, RunState::NotStarted);
        assert!(!surface.is_closed());
    }

    #[tokio::test]
    async fn test_login_only_saves_session() {
        let dir = tempfile::tempdir().unwrap();
        let surface = ScriptedSurface::new();
        dashboard(&surface, &portal());
        surface.set_session(session_cookie());

        let report = runner(surface.clone(), &dir).login().await;

        assert!(report.succeeded());
        assert_eq!(
            report.states,
            vec![
                RunState::NotStarted,
                RunState::SessionLoaded,
                RunState::SessionValid,
                RunState::SessionSaved,
                RunState::Closed,
            ]
        );
        assert!(dir.path().join("state.json").exists());
    }

    #[test]
    fn test_step_failure_display() {
        let failure = StepFailure {
            state: RunState::PostModalOpen,
            message: "Element not found: input".to_string(),
        };
        assert_eq!(
            failure.to_string(),
            "Element not found: input (after post modal open)"
        );
    }
}
