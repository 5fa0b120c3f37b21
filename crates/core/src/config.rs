use std::{
    path::PathBuf,
    time::Duration,
};

pub const DEFAULT_TARGET_URL: &str =
    "https://www.eventbrite.com/d/argentina--buenos-aires/all-events/";

/// Page to crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub url: String,
}

impl FetchTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for FetchTarget {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_URL)
    }
}

/// Knobs for the fetch collaborators.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Upper bound on a single fetch, including browser startup.
    pub timeout: Duration,
    /// How long the browser lets page scripts run before dumping the DOM.
    pub virtual_time_budget: Duration,
    /// Extra command-line switches passed to the browser.
    pub extra_args: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            virtual_time_budget: Duration::from_secs(10),
            extra_args: ["--disable-gpu", "--disable-dev-shm-usage", "--no-sandbox"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Byte encoding applied to both output artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputEncoding {
    #[default]
    Utf8,
    /// UTF-8 prefixed with a byte-order mark, for editors that need the hint.
    Utf8Bom,
}

impl OutputEncoding {
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            OutputEncoding::Utf8 => text.as_bytes().to_vec(),
            OutputEncoding::Utf8Bom => {
                let mut bytes = Vec::with_capacity(text.len() + 3);
                bytes.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
                bytes.extend_from_slice(text.as_bytes());
                bytes
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub target: FetchTarget,
    pub output_dir: PathBuf,
    pub encoding: OutputEncoding,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            target: FetchTarget::default(),
            output_dir: PathBuf::from("."),
            encoding: OutputEncoding::default(),
        }
    }
}
