use chrono::{DateTime, FixedOffset, TimeZone};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::RecordError;

// Raw epoch seconds in the source feed are wall-clock times at this offset.
pub const SOURCE_UTC_OFFSET_HOURS: i32 = 7;

pub const PAYLOAD_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

pub fn source_offset() -> FixedOffset {
    FixedOffset::east_opt(SOURCE_UTC_OFFSET_HOURS * 3600).expect("fixed offset is in range")
}

pub fn epoch_to_source_time(seconds: i64) -> Result<DateTime<FixedOffset>, RecordError> {
    source_offset()
        .timestamp_opt(seconds, 0)
        .single()
        .ok_or(RecordError::Timestamp(seconds))
}

pub fn format_payload_date(value: &DateTime<FixedOffset>) -> String {
    value.format(PAYLOAD_DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FaqRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
}

impl FaqRecord {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        start_date: DateTime<FixedOffset>,
        end_date: DateTime<FixedOffset>,
    ) -> Result<Self, RecordError> {
        let id = id.into();
        let title = title.into();
        let description = description.into();

        for (field, value) in [("id", &id), ("title", &title), ("description", &description)] {
            if value.trim().is_empty() {
                return Err(RecordError::MissingOrEmpty(field));
            }
        }

        Ok(Self {
            id,
            title,
            description,
            start_date,
            end_date,
        })
    }

    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiVector(Vec<Vec<f32>>);

impl MultiVector {
    pub fn new(vectors: Vec<Vec<f32>>) -> Result<Self, RecordError> {
        let dimensions = vectors.first().map(Vec::len).ok_or(RecordError::EmptyEmbedding)?;
        if dimensions == 0 {
            return Err(RecordError::EmptyEmbedding);
        }
        if vectors.iter().any(|vector| vector.len() != dimensions) {
            return Err(RecordError::MixedDimensions);
        }
        Ok(Self(vectors))
    }

    pub fn dimensions(&self) -> usize {
        self.0.first().map(Vec::len).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddedFaq {
    pub record: FaqRecord,
    pub embedding: MultiVector,
}

#[derive(Debug, Clone)]
pub struct IndexPoint {
    pub id: u64,
    pub vector: MultiVector,
    pub payload: BTreeMap<String, String>,
}

impl IndexPoint {
    pub fn from_embedded(id: u64, faq: EmbeddedFaq) -> Self {
        let mut payload = BTreeMap::new();
        payload.insert("faq_id".to_string(), faq.record.id);
        payload.insert("title".to_string(), faq.record.title);
        payload.insert("description".to_string(), faq.record.description);
        payload.insert(
            "start_date".to_string(),
            format_payload_date(&faq.record.start_date),
        );
        payload.insert(
            "end_date".to_string(),
            format_payload_date(&faq.record.end_date),
        );

        Self {
            id,
            vector: faq.embedding,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredPoint {
    pub payload: BTreeMap<String, String>,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FaqSearchResult {
    pub id: String,
    pub title: String,
    pub description: String,
    pub score: f64,
}

impl From<ScoredPoint> for FaqSearchResult {
    fn from(point: ScoredPoint) -> Self {
        let mut payload = point.payload;
        Self {
            id: payload.remove("faq_id").unwrap_or_default(),
            title: payload.remove("title").unwrap_or_default(),
            description: payload.remove("description").unwrap_or_default(),
            score: point.score,
        }
    }
}
