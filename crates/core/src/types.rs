use serde::{Deserialize, Serialize};

/// The fixed set of fields an event card can contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventField {
    Title,
    Datetime,
    Location,
    Url,
    ImageUrl,
}

impl EventField {
    pub const ALL: [EventField; 5] = [
        EventField::Title,
        EventField::Datetime,
        EventField::Location,
        EventField::Url,
        EventField::ImageUrl,
    ];

    /// Key used in the JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            EventField::Title => "title",
            EventField::Datetime => "datetime",
            EventField::Location => "location",
            EventField::Url => "url",
            EventField::ImageUrl => "image_url",
        }
    }
}

/// A partial event. `None` means the source element was not found,
/// which is distinct from a found element with an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl EventRecord {
    pub fn get(&self, field: EventField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: EventField, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    pub fn with(mut self, field: EventField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn has(&self, field: EventField) -> bool {
        self.slot(field).is_some()
    }

    pub fn is_empty(&self) -> bool {
        EventField::ALL.iter().all(|f| !self.has(*f))
    }

    /// Fields present in this record, in canonical order.
    pub fn present_fields(&self) -> Vec<EventField> {
        EventField::ALL
            .into_iter()
            .filter(|f| self.has(*f))
            .collect()
    }

    fn slot(&self, field: EventField) -> &Option<String> {
        match field {
            EventField::Title => &self.title,
            EventField::Datetime => &self.datetime,
            EventField::Location => &self.location,
            EventField::Url => &self.url,
            EventField::ImageUrl => &self.image_url,
        }
    }

    fn slot_mut(&mut self, field: EventField) -> &mut Option<String> {
        match field {
            EventField::Title => &mut self.title,
            EventField::Datetime => &mut self.datetime,
            EventField::Location => &mut self.location,
            EventField::Url => &mut self.url,
            EventField::ImageUrl => &mut self.image_url,
        }
    }
}

/// Records in the document order of the cards they came from.
///
/// Append-only: nothing between extraction and rendering sorts,
/// deduplicates or filters the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventBatch {
    records: Vec<EventRecord>,
}

impl EventBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EventRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EventRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }
}

impl<'a> IntoIterator for &'a EventBatch {
    type Item = &'a EventRecord;
    type IntoIter = std::slice::Iter<'a, EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<EventRecord> for EventBatch {
    fn from_iter<I: IntoIterator<Item = EventRecord>>(iter: I) -> Self {
        let mut batch = EventBatch::new();
        for record in iter {
            batch.push(record);
        }
        batch
    }
}
