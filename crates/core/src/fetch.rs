//! Fetch collaborators: anything that can turn a target URL into page markup.
//!
//! A collaborator hands out a session on `acquire`, renders pages with
//! `fetch`, and must get the session back through `release`. Fetch problems
//! are reported as [`FetchOutcome::Failed`] rather than as errors so that the
//! caller always reaches `release`. When the caller is cancelled or panics
//! before that, the session goes to `abandon` instead, which must not block.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use tokio::{fs, process::Command, time::timeout};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    browser::Browser,
    config::{FetchConfig, FetchTarget},
    error::Result,
    paths::get_session_dir,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Rendered { html: String },
    Failed { reason: String },
}

impl FetchOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        FetchOutcome::Failed {
            reason: reason.into(),
        }
    }
}

pub trait PageFetcher {
    type Session;

    async fn acquire(&self) -> Result<Self::Session>;
    async fn fetch(&self, session: &mut Self::Session, target: &FetchTarget) -> FetchOutcome;
    async fn release(&self, session: Self::Session) -> Result<()>;

    /// Best-effort synchronous cleanup for a session that never reached
    /// `release`. Runs from `Drop`.
    fn abandon(&self, session: Self::Session) {
        drop(session);
    }
}

/// Renders pages with a headless Chromium-family browser (`--dump-dom`).
pub struct BrowserFetcher {
    browser: Browser,
    executable: Option<PathBuf>,
    config: FetchConfig,
}

pub struct BrowserSession {
    pub id: String,
    pub executable: PathBuf,
    pub profile_dir: PathBuf,
}

impl BrowserFetcher {
    pub fn new(browser: Browser, config: FetchConfig) -> Self {
        Self {
            browser,
            executable: None,
            config,
        }
    }

    /// Use this executable instead of searching for one.
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = Some(executable.into());
        self
    }

    fn command(&self, session: &BrowserSession, target: &FetchTarget) -> Command {
        let mut command = Command::new(&session.executable);
        command
            .arg("--headless=new")
            .args(&self.config.extra_args)
            .arg(format!("--user-data-dir={}", session.profile_dir.display()))
            .arg(format!(
                "--virtual-time-budget={}",
                self.config.virtual_time_budget.as_millis()
            ))
            .arg("--dump-dom")
            .arg(&target.url)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

impl PageFetcher for BrowserFetcher {
    type Session = BrowserSession;

    async fn acquire(&self) -> Result<BrowserSession> {
        let executable = match &self.executable {
            Some(path) => path.clone(),
            None => self.browser.resolve_executable()?,
        };
        let id = Uuid::new_v4().to_string();
        let profile_dir = get_session_dir(&id);
        fs::create_dir_all(&profile_dir).await?;

        info!(session = %id, executable = %executable.display(), "browser session acquired");
        Ok(BrowserSession {
            id,
            executable,
            profile_dir,
        })
    }

    async fn fetch(&self, session: &mut BrowserSession, target: &FetchTarget) -> FetchOutcome {
        debug!(session = %session.id, url = %target.url, "rendering page");
        let mut command = self.command(session, target);

        let output = match timeout(self.config.timeout, command.output()).await {
            Err(_) => {
                return FetchOutcome::failed(format!(
                    "timeout after {}",
                    format_duration(self.config.timeout)
                ));
            }
            Ok(Err(e)) => {
                return FetchOutcome::failed(format!(
                    "could not launch {}: {}",
                    session.executable.display(),
                    e
                ));
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => format!("{} exited with {}", self.browser.name(), output.status),
                detail => detail.to_string(),
            };
            return FetchOutcome::failed(reason);
        }

        let html = String::from_utf8_lossy(&output.stdout).into_owned();
        if html.trim().is_empty() {
            return FetchOutcome::failed("browser returned an empty document");
        }
        FetchOutcome::Rendered { html }
    }

    async fn release(&self, session: BrowserSession) -> Result<()> {
        match fs::remove_dir_all(&session.profile_dir).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
        info!(session = %session.id, "browser session released");
        Ok(())
    }

    fn abandon(&self, session: BrowserSession) {
        match std::fs::remove_dir_all(&session.profile_dir) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                warn!(session = %session.id, error = %e, "could not remove abandoned profile");
            }
            _ => info!(session = %session.id, "abandoned browser session cleaned up"),
        }
    }
}

/// Plain HTTP GET. Only suitable for pages that render without scripts.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("eventcrawl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    type Session = ();

    async fn acquire(&self) -> Result<()> {
        Ok(())
    }

    async fn fetch(&self, _session: &mut (), target: &FetchTarget) -> FetchOutcome {
        let response = match self.client.get(&target.url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return FetchOutcome::failed(format!("timeout: {e}")),
            Err(e) => return FetchOutcome::failed(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::failed(format!("HTTP {}", status));
        }

        match response.text().await {
            Ok(html) => FetchOutcome::Rendered { html },
            Err(e) => FetchOutcome::failed(format!("failed to read response body: {e}")),
        }
    }

    async fn release(&self, _session: ()) -> Result<()> {
        Ok(())
    }
}

/// Serves markup saved on disk, e.g. a page dumped by an earlier run.
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageFetcher for FileFetcher {
    type Session = ();

    async fn acquire(&self) -> Result<()> {
        Ok(())
    }

    async fn fetch(&self, _session: &mut (), _target: &FetchTarget) -> FetchOutcome {
        match fs::read(&self.path).await {
            Ok(bytes) => FetchOutcome::Rendered {
                html: String::from_utf8_lossy(&bytes).into_owned(),
            },
            Err(e) => FetchOutcome::failed(format!("cannot read {}: {}", self.path.display(), e)),
        }
    }

    async fn release(&self, _session: ()) -> Result<()> {
        Ok(())
    }
}

fn format_duration(d: Duration) -> String {
    if d < Duration::from_secs(60) {
        let tenths = d.as_millis() / 100;
        format!("{}.{}s", tenths / 10, tenths % 10)
    } else {
        let secs = d.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
