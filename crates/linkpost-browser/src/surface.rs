use crate::launcher::ChromeLauncher;
use crate::locator::marked_selector;
use crate::profile::ScratchProfile;
use crate::session::{OriginStorage, SessionState, StorageEntry, StoredCookie};
use crate::{Error, Locator, Result};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::network::{
    Cookie, CookieParam, CookieSameSite, SetCookiesParams, TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::storage::GetCookiesParams;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How often `wait_for` re-checks the page
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// The handful of page operations the target adapter needs.
///
/// Every interaction assumes a single page; there is no tab management.
#[async_trait]
pub trait Surface: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;

    async fn is_visible(&self, locator: &Locator) -> Result<bool>;

    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Replace the value of an input by typing `text` into it
    async fn fill(&self, locator: &Locator, text: &str) -> Result<()>;

    async fn export_session(&self) -> Result<SessionState>;

    async fn import_session(&self, state: &SessionState) -> Result<()>;

    /// Release the browser. Must be safe to call after any failure.
    async fn close(&self) -> Result<()>;

    /// Poll until the element is visible, or fail with [`Error::Timeout`].
    ///
    /// A failed check counts as "not visible yet": evaluation errors while the
    /// page navigates are expected and must not end the wait early.
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut last_error = None;
        loop {
            match self.is_visible(locator).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!("Visibility check for {} failed, retrying: {}", locator, e);
                    last_error = Some(e.to_string());
                }
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout {
                    what: locator.to_string(),
                    after: timeout,
                    last_error,
                });
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }
}

/// Opens a fresh [`Surface`] for one automation run
#[async_trait]
pub trait Launch: Send + Sync {
    type Surface: Surface + 'static;

    async fn open(&self) -> Result<Self::Surface>;
}

#[async_trait]
impl Launch for ChromeLauncher {
    type Surface = ChromeSurface;

    async fn open(&self) -> Result<ChromeSurface> {
        ChromeSurface::launch(self).await
    }
}

/// A Chrome instance driven over CDP, with one page
pub struct ChromeSurface {
    browser: Mutex<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
    marks: AtomicU64,
    // Dropped after the browser so Chrome has released the directory.
    _profile: ScratchProfile,
}

#[derive(Deserialize)]
struct LocalStorageDump {
    origin: String,
    entries: Vec<StorageEntry>,
}

const DUMP_LOCAL_STORAGE_JS: &str = "JSON.stringify({ origin: location.origin, entries: \
     Array.from({ length: localStorage.length }, (_, i) => localStorage.key(i)) \
     .map(name => ({ name, value: localStorage.getItem(name) })) })";

impl ChromeSurface {
    /// Start Chrome on a scratch profile and open a blank page
    pub async fn launch(launcher: &ChromeLauncher) -> Result<Self> {
        let profile = ScratchProfile::new()?;
        let config = launcher.browser_config(profile.path())?;

        tracing::info!("Launching Chrome from {}", launcher.chrome_path().display());
        let (browser, mut handler) = Browser::launch(config).await?;

        // The handler must be polled for any CDP command to complete.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(e.into());
            }
        };

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler_task,
            marks: AtomicU64::new(0),
            _profile: profile,
        })
    }

    /// Find the element and return a CDP handle to it
    async fn resolve(&self, locator: &Locator) -> Result<Element> {
        let token = format!("lp-{}", self.marks.fetch_add(1, Ordering::Relaxed));
        let marked: bool = self
            .page
            .evaluate(locator.mark_js(&token))
            .await?
            .into_value()?;
        if !marked {
            return Err(Error::ElementNotFound(locator.to_string()));
        }
        Ok(self.page.find_element(marked_selector(&token)).await?)
    }
}

#[async_trait]
impl Surface for ChromeSurface {
    async fn goto(&self, url: &str) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        Ok(self
            .page
            .evaluate(locator.visible_js())
            .await?
            .into_value()?)
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        tracing::debug!("Clicking {}", locator);
        self.resolve(locator).await?.click().await?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        tracing::debug!("Filling {}", locator);
        let element = self.resolve(locator).await?;
        element.click().await?;
        element
            .call_js_fn("function() { this.value = ''; }", false)
            .await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn export_session(&self) -> Result<SessionState> {
        let cookies = self
            .page
            .execute(GetCookiesParams::default())
            .await?
            .result
            .cookies;

        let dump: String = self
            .page
            .evaluate(DUMP_LOCAL_STORAGE_JS)
            .await?
            .into_value()?;
        let dump: LocalStorageDump = serde_json::from_str(&dump)?;

        let origins = if dump.entries.is_empty() {
            Vec::new()
        } else {
            vec![OriginStorage {
                origin: dump.origin,
                local_storage: dump.entries,
            }]
        };

        Ok(SessionState {
            cookies: cookies.iter().map(stored_cookie).collect(),
            origins,
            saved_at: None,
        })
    }

    async fn import_session(&self, state: &SessionState) -> Result<()> {
        let params = state
            .cookies
            .iter()
            .map(cookie_param)
            .collect::<Result<Vec<_>>>()?;
        if !params.is_empty() {
            tracing::debug!("Restoring {} cookies", params.len());
            self.page.execute(SetCookiesParams::new(params)).await?;
        }

        // localStorage is per origin, so the page has to be on it first.
        for origin in state.origins.iter().filter(|o| !o.local_storage.is_empty()) {
            tracing::debug!(
                "Restoring {} localStorage entries for {}",
                origin.local_storage.len(),
                origin.origin
            );
            self.page.goto(origin.origin.as_str()).await?;
            let script = format!(
                "(() => {{ for (const e of {}) {{ localStorage.setItem(e.name, e.value); }} return true; }})()",
                serde_json::to_string(&origin.local_storage)?
            );
            self.page.evaluate(script).await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        let closed = browser.close().await;
        if closed.is_ok() {
            if let Err(e) = browser.wait().await {
                tracing::debug!("Error waiting for Chrome to exit: {}", e);
            }
        }
        self.handler_task.abort();
        closed?;
        tracing::debug!("Chrome closed");
        Ok(())
    }
}

fn stored_cookie(cookie: &Cookie) -> StoredCookie {
    StoredCookie {
        name: cookie.name.clone(),
        value: cookie.value.clone(),
        domain: cookie.domain.clone(),
        path: cookie.path.clone(),
        expires: if cookie.session { -1.0 } else { cookie.expires },
        http_only: cookie.http_only,
        secure: cookie.secure,
        same_site: cookie.same_site.as_ref().map(|s| {
            match s {
                CookieSameSite::Strict => "Strict",
                CookieSameSite::Lax => "Lax",
                CookieSameSite::None => "None",
            }
            .to_string()
        }),
    }
}

fn cookie_param(cookie: &StoredCookie) -> Result<CookieParam> {
    let mut builder = CookieParam::builder()
        .name(cookie.name.clone())
        .value(cookie.value.clone())
        .domain(cookie.domain.clone())
        .path(cookie.path.clone())
        .secure(cookie.secure)
        .http_only(cookie.http_only);

    if !cookie.is_session() {
        builder = builder.expires(TimeSinceEpoch::new(cookie.expires));
    }

    let same_site = match cookie.same_site.as_deref() {
        Some("Strict") => Some(CookieSameSite::Strict),
        Some("Lax") => Some(CookieSameSite::Lax),
        Some("None") => Some(CookieSameSite::None),
        _ => None,
    };
    if let Some(same_site) = same_site {
        builder = builder.same_site(same_site);
    }

    builder.build().map_err(Error::Browser)
}
