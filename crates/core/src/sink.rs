use std::path::Path;

use tokio::fs;
use tracing::info;

use crate::{
    config::OutputEncoding,
    error::{CrawlError, Result},
    types::EventBatch,
};

/// Save the batch as a pretty-printed JSON array
pub async fn save_events_json(
    batch: &EventBatch,
    path: &Path,
    encoding: OutputEncoding,
) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(batch)?;
    write_encoded(path, &pretty_json, encoding).await?;
    info!(path = %path.display(), events = batch.len(), "saved events json");
    Ok(())
}

/// Save a rendered document verbatim
pub async fn save_document(document: &str, path: &Path, encoding: OutputEncoding) -> Result<()> {
    write_encoded(path, document, encoding).await?;
    info!(path = %path.display(), bytes = document.len(), "saved events document");
    Ok(())
}

async fn write_encoded(path: &Path, text: &str, encoding: OutputEncoding) -> Result<()> {
    fs::write(path, encoding.encode(text))
        .await
        .map_err(|source| CrawlError::SinkFailed {
            path: path.to_path_buf(),
            source,
        })
}

/// Load a batch written by [`save_events_json`]
pub async fn load_events_json(path: &Path) -> Result<EventBatch> {
    let bytes = fs::read(path).await?;
    let text = String::from_utf8_lossy(&bytes);
    let batch = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;
    Ok(batch)
}
