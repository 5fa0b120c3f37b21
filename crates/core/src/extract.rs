use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::{
    error::{CrawlError, Result},
    types::{EventBatch, EventField, EventRecord},
};

/// Where a field's value comes from once its element is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Descendant text, surrounding whitespace stripped.
    Text,
    /// Attribute value, empty string when the attribute is missing.
    Attr(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSelector {
    pub field: EventField,
    pub selector: &'static str,
    pub source: ValueSource,
}

/// Static description of the markup: one selector for the card, one per field.
#[derive(Debug, Clone)]
pub struct SelectorSchema {
    pub card: &'static str,
    pub fields: Vec<FieldSelector>,
}

impl SelectorSchema {
    /// Eventbrite listing markup.
    pub fn eventbrite() -> Self {
        Self {
            card: r#"article[data-testid="event-card"]"#,
            fields: vec![
                FieldSelector {
                    field: EventField::Title,
                    selector: r#"div[data-testid="event-card-title"]"#,
                    source: ValueSource::Text,
                },
                FieldSelector {
                    field: EventField::Datetime,
                    selector: r#"div[data-testid="event-card-start-date"]"#,
                    source: ValueSource::Text,
                },
                FieldSelector {
                    field: EventField::Location,
                    selector: r#"div[data-testid="event-card-venue"]"#,
                    source: ValueSource::Text,
                },
                FieldSelector {
                    field: EventField::Url,
                    selector: r#"a[data-testid="event-card-link"]"#,
                    source: ValueSource::Attr("href"),
                },
                FieldSelector {
                    field: EventField::ImageUrl,
                    selector: "img",
                    source: ValueSource::Attr("src"),
                },
            ],
        }
    }
}

impl Default for SelectorSchema {
    fn default() -> Self {
        Self::eventbrite()
    }
}

struct CompiledField {
    field: EventField,
    selector: Selector,
    source: ValueSource,
}

/// A compiled [`SelectorSchema`]. Compiling is the only fallible step;
/// extraction itself never fails.
pub struct Extractor {
    card: Selector,
    fields: Vec<CompiledField>,
}

impl Extractor {
    pub fn new(schema: &SelectorSchema) -> Result<Self> {
        let card = compile(schema.card)?;
        let fields = schema
            .fields
            .iter()
            .map(|f| {
                Ok(CompiledField {
                    field: f.field,
                    selector: compile(f.selector)?,
                    source: f.source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { card, fields })
    }

    pub fn eventbrite() -> Result<Self> {
        Self::new(&SelectorSchema::eventbrite())
    }

    /// Extract one record per matched card, in document order.
    pub fn extract(&self, document: &Html) -> EventBatch {
        let mut batch = EventBatch::new();

        for (index, card) in document.select(&self.card).enumerate() {
            let record = self.extract_card(card);
            if record.is_empty() {
                debug!(index, "card yielded no fields, skipping");
                continue;
            }
            debug!(index, fields = ?record.present_fields(), "extracted card");
            batch.push(record);
        }

        batch
    }

    pub fn extract_html(&self, html: &str) -> EventBatch {
        let document = Html::parse_document(html);
        self.extract(&document)
    }

    fn extract_card(&self, card: ElementRef<'_>) -> EventRecord {
        let mut record = EventRecord::default();
        for field in &self.fields {
            if let Some(element) = find_field(card, &field.selector) {
                record.set(field.field, read_value(element, field.source));
            }
        }
        record
    }
}

/// First descendant of `unit` matching `selector`, if any.
pub fn find_field<'a>(unit: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    unit.select(selector).next()
}

fn read_value(element: ElementRef<'_>, source: ValueSource) -> String {
    match source {
        ValueSource::Text => element.text().collect::<String>().trim().to_string(),
        ValueSource::Attr(name) => element.value().attr(name).unwrap_or_default().to_string(),
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| CrawlError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Parse `html` and extract events with the Eventbrite schema.
pub fn extract_events(html: &str) -> Result<EventBatch> {
    Ok(Extractor::eventbrite()?.extract_html(html))
}
