//! Ingestion pipeline orchestration.
//!
//! Coordinates the full populate flow: fetch from the chunking service →
//! resolve source identity → filter and transform chunks → tiered write into
//! the vector store → structured outcome report.
//!
//! The write step is a tiered policy rather than exception-driven fallback:
//! the coordinator probes the store's capabilities and attempts the most
//! capable primitive first (upsert), degrading to insert and then
//! insert-then-update. Because ids are deterministic per
//! `(source_url, chunk_index)`, re-running a populate for the same source
//! converges to the same end state no matter which tier executed.

use serde::{Deserialize, Serialize};

use crate::chunks_client::ChunkSource;
use crate::error::IngestError;
use crate::identity::chunk_document_id;
use crate::models::{IngestRecord, SourcePayload};
use crate::store::VectorStore;

/// How many written ids the report echoes back, for operator sanity checks.
const REPORTED_ID_SAMPLE: usize = 5;

/// Caller-supplied populate parameters, from query string or request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PopulateParams {
    pub url: Option<String>,
    pub size: Option<String>,
}

impl PopulateParams {
    /// Merge two parameter channels; the primary (query) wins per field.
    pub fn merged(primary: Self, secondary: Self) -> Self {
        Self {
            url: primary.url.or(secondary.url),
            size: primary.size.or(secondary.size),
        }
    }
}

/// Which write tier ended up persisting the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePath {
    /// Upsert-by-id succeeded in one call.
    Upserted,
    /// Plain insert succeeded (all ids were new).
    Inserted,
    /// Insert hit existing ids; the batch was retried as an update.
    InsertedThenUpdated,
    /// Nothing qualified for writing; no store call was made.
    Skipped,
}

/// Outcome of a populate call.
#[derive(Debug, Serialize)]
pub struct IngestReport {
    pub status: &'static str,
    pub collection: String,
    pub source_url: String,
    /// Number of records written this call.
    pub added: usize,
    /// Chunk count as reported by the upstream, passed through untouched.
    pub chunks_count: Option<i64>,
    pub write_path: WritePath,
    /// First few written ids; never the full list.
    pub sample_ids: Vec<String>,
}

/// Resolve the source identity for this call.
///
/// Resolved once and reused for every id derivation and metadata record:
/// payload url, else the requested url, else the literal `"unknown"`.
pub fn resolve_source_url(payload: &SourcePayload, requested: Option<&str>) -> String {
    payload
        .url
        .clone()
        .or_else(|| requested.map(|u| u.to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Filter and transform a payload into write-ready records.
///
/// Chunks with no paragraphs are excluded entirely (no record, no id).
/// Output preserves payload order, so the parallel id/document/metadata
/// sequences handed to the store stay index-aligned.
pub fn build_records(source_url: &str, payload: &SourcePayload) -> Vec<IngestRecord> {
    payload
        .chunks
        .iter()
        .filter(|chunk| !chunk.paragraphs.is_empty())
        .map(|chunk| IngestRecord {
            document_id: chunk_document_id(source_url, chunk.index),
            document_text: chunk.paragraphs.join("\n\n"),
            metadata: IngestRecord::build_metadata(source_url, chunk, payload),
        })
        .collect()
}

/// Write a batch using the most capable primitive the store supports.
async fn tiered_write(
    store: &dyn VectorStore,
    records: &[IngestRecord],
) -> Result<WritePath, IngestError> {
    let ids: Vec<String> = records.iter().map(|r| r.document_id.clone()).collect();
    let documents: Vec<String> = records.iter().map(|r| r.document_text.clone()).collect();
    let metadatas: Vec<_> = records.iter().map(|r| r.metadata.clone()).collect();

    if store.supports_upsert() {
        return match store.upsert(&ids, &documents, &metadatas).await {
            Ok(()) => Ok(WritePath::Upserted),
            Err(e) => Err(IngestError::StoreWriteFailure {
                collection: store.collection_name().to_string(),
                details: format!("upsert: {}", e),
            }),
        };
    }

    let insert_err = match store.add(&ids, &documents, &metadatas).await {
        Ok(()) => return Ok(WritePath::Inserted),
        Err(e) => e,
    };

    if store.supports_update() {
        tracing::warn!(
            collection = store.collection_name(),
            error = %insert_err,
            "insert failed, retrying batch as update"
        );
        return match store.update(&ids, &documents, &metadatas).await {
            Ok(()) => Ok(WritePath::InsertedThenUpdated),
            Err(update_err) => Err(IngestError::StoreWriteFailure {
                collection: store.collection_name().to_string(),
                details: format!("insert: {}; update: {}", insert_err, update_err),
            }),
        };
    }

    Err(IngestError::StoreWriteFailure {
        collection: store.collection_name().to_string(),
        details: format!("insert: {}; store has no update tier", insert_err),
    })
}

/// Run the full populate flow.
///
/// On any fetch failure no writes are attempted. A payload whose chunks all
/// filter out is not an error: the write step is skipped and the report
/// carries `added = 0` with the upstream chunk count passed through.
pub async fn run_populate(
    source: &dyn ChunkSource,
    store: &dyn VectorStore,
    params: &PopulateParams,
) -> Result<IngestReport, IngestError> {
    let payload = source
        .fetch_chunks(params.url.as_deref(), params.size.as_deref())
        .await?;

    let source_url = resolve_source_url(&payload, params.url.as_deref());
    let records = build_records(&source_url, &payload);

    if records.is_empty() {
        tracing::info!(source_url = %source_url, "no qualifying chunks, skipping write");
        return Ok(IngestReport {
            status: "ok",
            collection: store.collection_name().to_string(),
            source_url,
            added: 0,
            chunks_count: payload.chunks_count,
            write_path: WritePath::Skipped,
            sample_ids: Vec::new(),
        });
    }

    let write_path = tiered_write(store, &records).await?;

    tracing::info!(
        source_url = %source_url,
        added = records.len(),
        write_path = ?write_path,
        "populate complete"
    );

    Ok(IngestReport {
        status: "ok",
        collection: store.collection_name().to_string(),
        source_url,
        added: records.len(),
        chunks_count: payload.chunks_count,
        write_path,
        sample_ids: records
            .iter()
            .take(REPORTED_ID_SAMPLE)
            .map(|r| r.document_id.clone())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::chunks_client::RawUpstreamResponse;
    use crate::models::Chunk;
    use crate::store::memory::MemoryVectorStore;

    struct FixedSource {
        payload: SourcePayload,
    }

    #[async_trait]
    impl ChunkSource for FixedSource {
        async fn fetch_chunks(
            &self,
            _url: Option<&str>,
            _size: Option<&str>,
        ) -> Result<SourcePayload, IngestError> {
            Ok(self.payload.clone())
        }

        async fn fetch_raw(
            &self,
            _params: &[(String, String)],
        ) -> Result<RawUpstreamResponse, IngestError> {
            Ok(RawUpstreamResponse {
                status: 200,
                content_type: None,
                body: Vec::new(),
            })
        }
    }

    fn chunk(index: i64, paragraphs: &[&str]) -> Chunk {
        Chunk {
            index: Some(index),
            paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
            start_paragraph: Some(index * 2),
            end_paragraph: Some(index * 2 + 1),
            size: Some(paragraphs.iter().map(|p| p.len() as i64).sum()),
        }
    }

    fn payload(url: &str, chunks: Vec<Chunk>) -> SourcePayload {
        let count = chunks.len() as i64;
        SourcePayload {
            url: Some(url.to_string()),
            chunks,
            chunks_count: Some(count),
            chunk_size: Some(1000),
            paragraph_count: Some(12),
        }
    }

    #[test]
    fn joins_paragraphs_with_blank_line() {
        let payload = payload("http://x/doc", vec![chunk(0, &["a", "b"])]);
        let records = build_records("http://x/doc", &payload);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].document_text, "a\n\nb");
        assert_eq!(
            records[0].document_id,
            chunk_document_id("http://x/doc", Some(0))
        );
    }

    #[test]
    fn empty_chunks_are_excluded() {
        let payload = payload(
            "http://x/doc",
            vec![chunk(0, &["a"]), chunk(1, &[]), chunk(2, &["c"])],
        );
        let records = build_records("http://x/doc", &payload);
        assert_eq!(records.len(), 2);
        // order preserved, no id consumed by the empty chunk
        assert_eq!(
            records[0].document_id,
            chunk_document_id("http://x/doc", Some(0))
        );
        assert_eq!(
            records[1].document_id,
            chunk_document_id("http://x/doc", Some(2))
        );
    }

    #[test]
    fn metadata_carries_chunk_and_payload_fields() {
        let payload = payload("http://x/doc", vec![chunk(3, &["a"])]);
        let records = build_records("http://x/doc", &payload);
        let meta = &records[0].metadata;
        assert_eq!(meta["source_url"], "http://x/doc");
        assert_eq!(meta["chunk_index"], 3);
        assert_eq!(meta["start_paragraph"], 6);
        assert_eq!(meta["end_paragraph"], 7);
        assert_eq!(meta["chunk_size"], 1000);
        assert_eq!(meta["paragraph_count_total"], 12);
    }

    #[test]
    fn source_url_resolution_order() {
        let with_url = payload("http://payload/doc", vec![]);
        assert_eq!(
            resolve_source_url(&with_url, Some("http://requested/doc")),
            "http://payload/doc"
        );

        let without_url = SourcePayload::default();
        assert_eq!(
            resolve_source_url(&without_url, Some("http://requested/doc")),
            "http://requested/doc"
        );
        assert_eq!(resolve_source_url(&without_url, None), "unknown");
    }

    #[test]
    fn query_params_override_body_params() {
        let merged = PopulateParams::merged(
            PopulateParams {
                url: Some("http://query".into()),
                size: None,
            },
            PopulateParams {
                url: Some("http://body".into()),
                size: Some("500".into()),
            },
        );
        assert_eq!(merged.url.as_deref(), Some("http://query"));
        assert_eq!(merged.size.as_deref(), Some("500"));
    }

    #[tokio::test]
    async fn empty_payload_short_circuits_without_writes() {
        let source = FixedSource {
            payload: SourcePayload {
                url: Some("http://x/doc".into()),
                chunks: vec![chunk(0, &[])],
                chunks_count: Some(1),
                ..Default::default()
            },
        };
        let store = MemoryVectorStore::new("corpus");

        let report = run_populate(&source, &store, &PopulateParams::default())
            .await
            .unwrap();

        assert_eq!(report.added, 0);
        assert_eq!(report.chunks_count, Some(1));
        assert_eq!(report.write_path, WritePath::Skipped);
        assert_eq!(store.total_write_calls(), 0);
    }

    #[tokio::test]
    async fn upsert_tier_is_idempotent() {
        let source = FixedSource {
            payload: payload("http://x/doc", vec![chunk(0, &["a", "b"]), chunk(1, &["c"])]),
        };
        let store = MemoryVectorStore::new("corpus");

        let first = run_populate(&source, &store, &PopulateParams::default())
            .await
            .unwrap();
        let second = run_populate(&source, &store, &PopulateParams::default())
            .await
            .unwrap();

        assert_eq!(first.write_path, WritePath::Upserted);
        assert_eq!(second.write_path, WritePath::Upserted);
        assert_eq!(second.added, 2);
        // same source twice, same ids: no duplicates
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(first.sample_ids, second.sample_ids);
    }

    #[tokio::test]
    async fn insert_tier_used_when_upsert_missing() {
        let source = FixedSource {
            payload: payload("http://x/doc", vec![chunk(0, &["a"])]),
        };
        let store = MemoryVectorStore::without_upsert("corpus");

        let report = run_populate(&source, &store, &PopulateParams::default())
            .await
            .unwrap();
        assert_eq!(report.write_path, WritePath::Inserted);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn insert_conflict_falls_back_to_update() {
        let source = FixedSource {
            payload: payload("http://x/doc", vec![chunk(0, &["a"])]),
        };
        let store = MemoryVectorStore::without_upsert("corpus");

        let first = run_populate(&source, &store, &PopulateParams::default())
            .await
            .unwrap();
        let second = run_populate(&source, &store, &PopulateParams::default())
            .await
            .unwrap();

        assert_eq!(first.write_path, WritePath::Inserted);
        assert_eq!(second.write_path, WritePath::InsertedThenUpdated);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn exhausted_tiers_surface_write_failure() {
        let source = FixedSource {
            payload: payload("http://x/doc", vec![chunk(0, &["a"])]),
        };
        let store = MemoryVectorStore::insert_only("corpus");

        // first call lands via plain insert
        run_populate(&source, &store, &PopulateParams::default())
            .await
            .unwrap();

        // second call conflicts and has no fallback tier
        let err = run_populate(&source, &store, &PopulateParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::StoreWriteFailure { .. }));
    }

    #[tokio::test]
    async fn report_caps_sample_ids_at_five() {
        let chunks: Vec<Chunk> = (0..8).map(|i| chunk(i, &["text"])).collect();
        let source = FixedSource {
            payload: payload("http://x/doc", chunks),
        };
        let store = MemoryVectorStore::new("corpus");

        let report = run_populate(&source, &store, &PopulateParams::default())
            .await
            .unwrap();
        assert_eq!(report.added, 8);
        assert_eq!(report.sample_ids.len(), 5);
    }
}
