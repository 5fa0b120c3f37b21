//! eventcrawl core library
//!
//! Fetches a rendered event-listing page, extracts partial event records
//! from its markup, and writes them out as JSON and Markdown.

pub mod browser;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod format;
pub mod paths;
pub mod pipeline;
pub mod sink;
pub mod types;

// Re-export commonly used items at crate root
pub use browser::{BROWSER_ENV_VAR, Browser, BrowserConfig};
pub use config::{CrawlConfig, DEFAULT_TARGET_URL, FetchConfig, FetchTarget, OutputEncoding};
pub use error::{CrawlError, FailureKind, Result};
pub use extract::{Extractor, SelectorSchema, extract_events, find_field};
pub use fetch::{BrowserFetcher, FetchOutcome, FileFetcher, HttpFetcher, PageFetcher};
pub use format::render;
pub use paths::{get_events_json_path, get_events_markdown_path};
pub use pipeline::{CrawlReport, CrawlState, SinkReport, run_crawl};
pub use sink::{load_events_json, save_document, save_events_json};
pub use types::{EventBatch, EventField, EventRecord};
