//! In-memory stand-ins for a browser, used by the adapter and runner tests.

use crate::session::SessionState;
use crate::{Error, Launch, Locator, Operator, Result, Surface};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A page whose visible elements are set by the test
#[derive(Default)]
pub(crate) struct ScriptedSurface {
    visible: Mutex<HashSet<Locator>>,
    actions: Mutex<Vec<String>>,
    fail_on: Mutex<Option<String>>,
    session: Mutex<SessionState>,
    imported: Mutex<Option<SessionState>>,
    closed: AtomicBool,
    visibility_errors: AtomicUsize,
    visibility_checks: AtomicUsize,
}

impl ScriptedSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn show(&self, locator: &Locator) {
        self.visible.lock().unwrap().insert(locator.clone());
    }

    pub fn show_all(&self, locators: &[Locator]) {
        for locator in locators {
            self.show(locator);
        }
    }

    /// Make the action with this description fail, e.g. `click:li`
    pub fn fail_on(&self, action: String) {
        *self.fail_on.lock().unwrap() = Some(action);
    }

    /// Make the next `count` visibility checks fail as if the page were navigating
    pub fn fail_visibility_checks(&self, count: usize) {
        self.visibility_errors.store(count, Ordering::SeqCst);
    }

    pub fn visibility_checks(&self) -> usize {
        self.visibility_checks.load(Ordering::SeqCst)
    }

    pub fn set_session(&self, state: SessionState) {
        *self.session.lock().unwrap() = state;
    }

    pub fn imported(&self) -> Option<SessionState> {
        self.imported.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn act(&self, action: String) -> Result<()> {
        if self.fail_on.lock().unwrap().as_deref() == Some(action.as_str()) {
            return Err(Error::Cdp(format!("{} failed", action)));
        }
        self.actions.lock().unwrap().push(action);
        Ok(())
    }
}

#[async_trait]
impl Surface for Arc<ScriptedSurface> {
    async fn goto(&self, url: &str) -> Result<()> {
        self.act(format!("goto:{}", url))
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        self.visibility_checks.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .visibility_errors
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::Cdp("Execution context was destroyed".to_string()));
        }
        Ok(self.visible.lock().unwrap().contains(locator))
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        self.act(format!("click:{}", locator))
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        self.act(format!("fill:{}={}", locator, text))
    }

    async fn export_session(&self) -> Result<SessionState> {
        Ok(self.session.lock().unwrap().clone())
    }

    async fn import_session(&self, state: &SessionState) -> Result<()> {
        *self.imported.lock().unwrap() = Some(state.clone());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out the same scripted surface on every launch
pub(crate) struct ScriptedLauncher {
    pub surface: Arc<ScriptedSurface>,
    pub fail: bool,
}

impl ScriptedLauncher {
    pub fn new(surface: Arc<ScriptedSurface>) -> Self {
        Self {
            surface,
            fail: false,
        }
    }
}

#[async_trait]
impl Launch for ScriptedLauncher {
    type Surface = Arc<ScriptedSurface>;

    async fn open(&self) -> Result<Arc<ScriptedSurface>> {
        if self.fail {
            return Err(Error::Browser("Chrome not found".to_string()));
        }
        Ok(self.surface.clone())
    }
}

#[derive(Default)]
pub(crate) struct RecordingOperator {
    events: Mutex<Vec<String>>,
}

impl RecordingOperator {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl Operator for RecordingOperator {
    fn otp_requested(&self, account: &str, _timeout: Duration) {
        self.events
            .lock()
            .unwrap()
            .push(format!("requested:{}", account));
    }

    fn otp_finished(&self, signed_in: bool) {
        self.events
            .lock()
            .unwrap()
            .push(format!("finished:{}", signed_in));
    }
}
