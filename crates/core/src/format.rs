use crate::types::{EventBatch, EventRecord};

pub const DOCUMENT_TITLE: &str = "# Eventos en Buenos Aires";
pub const SEPARATOR: &str = "---";

pub const UNTITLED: &str = "Sin título";
pub const NO_DATETIME: &str = "No especificado";
pub const NO_LOCATION: &str = "No especificada";
pub const LINK_TEXT_FALLBACK: &str = "Ver evento";
pub const LINK_TARGET_FALLBACK: &str = "#";

/// Format an event batch as a Markdown document.
///
/// Fallbacks stand in for absent fields only; a present empty value is
/// written as-is. The image line needs a non-empty `image_url`.
pub fn render(batch: &EventBatch) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n\n", DOCUMENT_TITLE));

    for event in batch {
        output.push_str(&format_event(event));
    }

    output
}

/// One record's block, separator included.
pub fn format_event(event: &EventRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "## {}\n\n",
        event.title.as_deref().unwrap_or(UNTITLED)
    ));
    output.push_str(&format!(
        "**Fecha y hora:** {}\n\n",
        event.datetime.as_deref().unwrap_or(NO_DATETIME)
    ));
    output.push_str(&format!(
        "**Ubicación:** {}\n\n",
        event.location.as_deref().unwrap_or(NO_LOCATION)
    ));
    output.push_str(&format!(
        "**Link:** [{}]({})\n\n",
        event.title.as_deref().unwrap_or(LINK_TEXT_FALLBACK),
        event.url.as_deref().unwrap_or(LINK_TARGET_FALLBACK)
    ));

    if let Some(image) = event.image_url.as_deref().filter(|s| !s.is_empty()) {
        output.push_str(&format!("![Imagen del evento]({})\n\n", image));
    }

    output.push_str(&format!("{}\n\n", SEPARATOR));
    output
}
