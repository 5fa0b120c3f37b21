use std::path::{Path, PathBuf};

pub const EVENTS_JSON: &str = "eventbrite_events.json";
pub const EVENTS_MARKDOWN: &str = "eventbrite_events.md";

/// Get the path of the structured-data artifact
pub fn get_events_json_path(output_dir: &Path) -> PathBuf {
    output_dir.join(EVENTS_JSON)
}

/// Get the path of the Markdown artifact
pub fn get_events_markdown_path(output_dir: &Path) -> PathBuf {
    output_dir.join(EVENTS_MARKDOWN)
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("eventcrawl")
}

/// Get the browser profile directory for one fetch session
pub fn get_session_dir(session_id: &str) -> PathBuf {
    get_root_cache_dir().join("sessions").join(session_id)
}
