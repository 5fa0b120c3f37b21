use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Fetch failed for {target}: {reason}")]
    FetchFailed { target: String, reason: String },

    #[error("No {browser} executable found (set EVENTCRAWL_BROWSER or pass --browser-path)")]
    BrowserNotFound { browser: String },

    #[error("Invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Failed to write {path}: {source}")]
    SinkFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Coarse classification used by callers to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The fetch collaborator reported an unsuccessful result.
    FetchFailure,
    /// Anything else that went wrong during the run.
    UnexpectedFailure,
}

impl CrawlError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CrawlError::FetchFailed { .. } => FailureKind::FetchFailure,
            _ => FailureKind::UnexpectedFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
