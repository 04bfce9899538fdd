use crate::{Error, Result};
use chromiumoxide::browser::BrowserConfig;
use std::path::{Path, PathBuf};

/// Builds the Chrome configuration for an automation run
pub struct ChromeLauncher {
    chrome_path: PathBuf,
    headless: bool,
    window_size: (u32, u32),
}

impl ChromeLauncher {
    /// Create a new ChromeLauncher.
    ///
    /// Runs are headed unless `headless` is set, because the login branch
    /// needs an operator to type a one-time code into the page.
    pub fn new(chrome_path: PathBuf, headless: bool) -> Self {
        Self {
            chrome_path,
            headless,
            window_size: (1280, 900),
        }
    }

    pub fn chrome_path(&self) -> &Path {
        &self.chrome_path
    }

    pub fn is_headless(&self) -> bool {
        self.headless
    }

    /// Extra Chrome command-line arguments
    fn build_args(&self) -> Vec<String> {
        vec![
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-features=Translate".to_string(),
            "--password-store=basic".to_string(),
        ]
    }

    pub(crate) fn browser_config(&self, profile_path: &Path) -> Result<BrowserConfig> {
        let (width, height) = self.window_size;
        let mut builder = BrowserConfig::builder()
            .chrome_executable(&self.chrome_path)
            .user_data_dir(profile_path)
            .window_size(width, height)
            .args(self.build_args());

        if !self.headless {
            builder = builder.with_head();
        }

        builder
            .build()
            .map_err(|e| Error::Browser(format!("Invalid Chrome configuration: {}", e)))
    }
}
