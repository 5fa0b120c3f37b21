use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use crate::error::{CrawlError, Result};

pub const BROWSER_ENV_VAR: &str = "EVENTCRAWL_BROWSER";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Chrome,
    Edge,
}

pub struct BrowserConfig {
    /// Executable names tried in order on `PATH`.
    pub executables: &'static [&'static str],
}

impl Browser {
    pub fn config(&self) -> BrowserConfig {
        match self {
            Browser::Chromium => BrowserConfig {
                executables: &["chromium", "chromium-browser"],
            },
            Browser::Chrome => BrowserConfig {
                executables: &["google-chrome", "google-chrome-stable", "chrome"],
            },
            Browser::Edge => BrowserConfig {
                executables: &["microsoft-edge", "microsoft-edge-stable", "msedge"],
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Browser::Chromium => "Chromium",
            Browser::Chrome => "Chrome",
            Browser::Edge => "Edge",
        }
    }

    /// Locate the executable: `EVENTCRAWL_BROWSER` wins, then `PATH`.
    pub fn resolve_executable(&self) -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(BROWSER_ENV_VAR).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        let cwd = std::env::current_dir()?;
        self.find_in(std::env::var_os("PATH"), &cwd)
            .ok_or_else(|| CrawlError::BrowserNotFound {
                browser: self.name().to_string(),
            })
    }

    /// First candidate that is an executable file on `paths`.
    fn find_in<P: AsRef<OsStr>>(&self, paths: Option<P>, cwd: &Path) -> Option<PathBuf> {
        self.config()
            .executables
            .iter()
            .find_map(|exe| which::which_in(exe, paths.as_ref(), cwd).ok())
    }
}
