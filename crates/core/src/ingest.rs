use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::embedding::{Embedder, EmbeddingMode};
use crate::error::{IngestError, RecordError};
use crate::models::{epoch_to_source_time, EmbeddedFaq, FaqRecord, IndexPoint};
use crate::retry::{retry, retry_unit, DEFAULT_MAX_ATTEMPTS};
use crate::traits::VectorIndex;

#[derive(Debug, Deserialize)]
struct RawFaqLine {
    id: String,
    title: String,
    desc: String,
    start_date: i64,
    end_date: i64,
}

#[derive(Debug)]
pub struct SkippedLine {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug)]
pub struct SourceReport {
    pub records: Vec<FaqRecord>,
    pub skipped: Vec<SkippedLine>,
}

pub fn read_faq_jsonl(path: &Path) -> Result<SourceReport, IngestError> {
    let raw = fs::read_to_string(path)?;
    Ok(parse_faq_jsonl(&raw))
}

pub fn parse_faq_jsonl(source: &str) -> SourceReport {
    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for (index, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_faq_line(line) {
            Ok(record) => records.push(record),
            Err(error) => skipped.push(SkippedLine {
                line: index + 1,
                reason: error.to_string(),
            }),
        }
    }

    SourceReport { records, skipped }
}

fn parse_faq_line(line: &str) -> Result<FaqRecord, RecordError> {
    let raw: RawFaqLine = serde_json::from_str(line)?;
    FaqRecord::new(
        raw.id,
        raw.title,
        raw.desc,
        epoch_to_source_time(raw.start_date)?,
        epoch_to_source_time(raw.end_date)?,
    )
}

#[derive(Debug)]
pub struct SkippedRecord {
    pub faq_id: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct IngestReport {
    pub ingested: Vec<String>,
    pub skipped: Vec<SkippedRecord>,
}

pub struct IngestionPipeline<E, V> {
    embedder: E,
    index: V,
    max_attempts: u32,
}

impl<E, V> IngestionPipeline<E, V>
where
    E: Embedder + Send + Sync,
    V: VectorIndex + Send + Sync,
{
    pub fn new(embedder: E, index: V) -> Self {
        Self {
            embedder,
            index,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub async fn ingest(
        &self,
        records: &[FaqRecord],
        collection: &str,
    ) -> Result<IngestReport, IngestError> {
        let mut points = Vec::new();
        let mut ingested = Vec::new();
        let mut skipped = Vec::new();

        // Ids restart at 1 for every batch. Re-running against a non-empty
        // collection therefore adds new points instead of replacing old ones;
        // callers that need a clean re-ingest must recreate the collection.
        let mut next_id = 1u64;

        for record in records {
            let text = record.embedding_text();
            let embedded = retry(
                || self.embedder.embed(&text, EmbeddingMode::Document),
                self.max_attempts,
                "embed faq record",
            )
            .await;

            match embedded {
                Ok(embedding) => {
                    let faq = EmbeddedFaq {
                        record: record.clone(),
                        embedding,
                    };
                    points.push(IndexPoint::from_embedded(next_id, faq));
                    next_id += 1;
                    ingested.push(record.id.clone());
                }
                Err(error) => {
                    warn!(faq_id = %record.id, error = %error, "skipping faq record");
                    skipped.push(SkippedRecord {
                        faq_id: record.id.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        if !points.is_empty() {
            retry_unit(
                || self.index.upsert(collection, &points),
                self.max_attempts,
                "upsert faq points",
            )
            .await?;
        }

        Ok(IngestReport { ingested, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_faq_jsonl, read_faq_jsonl, IngestionPipeline};
    use crate::embedding::{Embedder, EmbeddingMode, HashedTokenEmbedder};
    use crate::error::EmbeddingError;
    use crate::models::MultiVector;
    use crate::stores::InMemoryIndex;
    use crate::traits::VectorIndex;
    use async_trait::async_trait;
    use std::fs;
    use tempfile::tempdir;

    const GOOD_LINE: &str = r#"{"id":"f1","title":"Reset password","desc":"How do I reset my password","start_date":1700000000,"end_date":1700100000}"#;

    #[test]
    fn parses_well_formed_lines() {
        let report = parse_faq_jsonl(GOOD_LINE);
        assert_eq!(report.records.len(), 1);
        assert!(report.skipped.is_empty());

        let record = &report.records[0];
        assert_eq!(record.id, "f1");
        assert_eq!(record.title, "Reset password");
    }

    #[test]
    fn skips_lines_with_missing_fields() {
        let source = format!(
            "{GOOD_LINE}\n{}",
            r#"{"id":"f2","desc":"orphan","start_date":1700000000,"end_date":1700100000}"#
        );
        let report = parse_faq_jsonl(&source);

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, 2);
    }

    #[test]
    fn skips_unparseable_lines_without_failing() {
        let source = format!("not json at all\n{GOOD_LINE}");
        let report = parse_faq_jsonl(&source);

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, 1);
    }

    #[test]
    fn ignores_blank_lines() {
        let source = format!("\n{GOOD_LINE}\n\n");
        let report = parse_faq_jsonl(&source);
        assert_eq!(report.records.len(), 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn reads_source_files_from_disk() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("faq.jsonl");
        fs::write(&path, GOOD_LINE)?;

        let report = read_faq_jsonl(&path)?;
        assert_eq!(report.records.len(), 1);
        Ok(())
    }

    struct RefusingEmbedder {
        poison: &'static str,
    }

    #[async_trait]
    impl Embedder for RefusingEmbedder {
        fn dimensions(&self) -> usize {
            4
        }

        async fn embed(
            &self,
            text: &str,
            _mode: EmbeddingMode,
        ) -> Result<MultiVector, EmbeddingError> {
            if text.contains(self.poison) {
                return Err(EmbeddingError::UnexpectedStatus {
                    status: "503 Service Unavailable".to_string(),
                    body: String::new(),
                });
            }
            MultiVector::new(vec![vec![1.0; 4]])
                .map_err(|error| EmbeddingError::MalformedResponse(error.to_string()))
        }
    }

    fn record(id: &str, title: &str, description: &str) -> crate::models::FaqRecord {
        let start = crate::models::epoch_to_source_time(1_700_000_000).expect("valid timestamp");
        let end = crate::models::epoch_to_source_time(1_700_100_000).expect("valid timestamp");
        crate::models::FaqRecord::new(id, title, description, start, end).expect("valid record")
    }

    #[tokio::test]
    async fn ingests_records_with_batch_scoped_ids() {
        let index = InMemoryIndex::new();
        index
            .create_multivector_collection("faq")
            .await
            .expect("create succeeds");

        let embedder = HashedTokenEmbedder::default();
        let pipeline = IngestionPipeline::new(embedder, &index);
        let records = vec![
            record("f1", "Reset password", "How do I reset my password"),
            record("f2", "Shipping costs", "Where can I see shipping costs"),
        ];

        let report = pipeline
            .ingest(&records, "faq")
            .await
            .expect("ingest succeeds");

        assert_eq!(report.ingested, vec!["f1".to_string(), "f2".to_string()]);
        assert!(report.skipped.is_empty());

        let query = embedder
            .embed("reset password", EmbeddingMode::Query)
            .await
            .expect("query embeds");
        let hits = index
            .query_nearest("faq", &query, 10)
            .await
            .expect("query succeeds");
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn embedding_failure_skips_the_record_and_keeps_the_rest() {
        let index = InMemoryIndex::new();
        index
            .create_multivector_collection("faq")
            .await
            .expect("create succeeds");

        let pipeline =
            IngestionPipeline::new(RefusingEmbedder { poison: "billing" }, index).with_max_attempts(2);
        let records = vec![
            record("f1", "Reset password", "How do I reset my password"),
            record("f2", "Billing", "Why was my billing plan charged twice"),
        ];

        let report = pipeline
            .ingest(&records, "faq")
            .await
            .expect("batch still succeeds");

        assert_eq!(report.ingested, vec!["f1".to_string()]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].faq_id, "f2");
        assert!(report.skipped[0].reason.contains("retries exhausted"));
    }

    #[tokio::test]
    async fn reingesting_a_batch_duplicates_points() {
        let index = InMemoryIndex::new();
        index
            .create_multivector_collection("faq")
            .await
            .expect("create succeeds");

        let embedder = HashedTokenEmbedder::default();
        let pipeline = IngestionPipeline::new(embedder, &index);
        let records = vec![record("f1", "Reset password", "How do I reset my password")];

        pipeline.ingest(&records, "faq").await.expect("first run");
        pipeline.ingest(&records, "faq").await.expect("second run");

        let query = embedder
            .embed("reset password", EmbeddingMode::Query)
            .await
            .expect("query embeds");
        let hits = index
            .query_nearest("faq", &query, 10)
            .await
            .expect("query succeeds");

        // Same faq twice under different synthetic ids; the counter restarts
        // per batch, so the second run did not overwrite the first.
        assert_eq!(hits.len(), 2);
    }
}
