//! Core data models flowing through the ingestion pipeline.
//!
//! [`SourcePayload`] and [`Chunk`] mirror the JSON returned by the upstream
//! chunking service; [`IngestRecord`] is the transient write-side shape handed
//! to the vector store and discarded afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single chunk as reported by the upstream chunking service.
///
/// Everything except `paragraphs` is optional: the upstream contract has
/// drifted across versions and older deployments omit the bookkeeping fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chunk {
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub start_paragraph: Option<i64>,
    #[serde(default)]
    pub end_paragraph: Option<i64>,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Response body of the upstream chunking service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourcePayload {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub chunks: Vec<Chunk>,
    #[serde(default)]
    pub chunks_count: Option<i64>,
    #[serde(default)]
    pub chunk_size: Option<i64>,
    #[serde(default)]
    pub paragraph_count: Option<i64>,
}

/// A fully-prepared record ready to be written to the vector store.
///
/// Built fresh per ingestion call and discarded once written; the vector
/// store is the sole durable owner of persisted documents.
#[derive(Debug, Clone)]
pub struct IngestRecord {
    /// Deterministic id derived from `(source_url, chunk_index)`.
    pub document_id: String,
    /// Chunk paragraphs joined by a blank-line separator.
    pub document_text: String,
    /// Flat metadata map stored alongside the document.
    pub metadata: Map<String, Value>,
}

impl IngestRecord {
    /// Build the metadata map for a chunk.
    ///
    /// Absent upstream values are omitted rather than stored as nulls, since
    /// vector-store metadata values must be scalars.
    pub fn build_metadata(
        source_url: &str,
        chunk: &Chunk,
        payload: &SourcePayload,
    ) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert("source_url".into(), Value::from(source_url));
        if let Some(index) = chunk.index {
            meta.insert("chunk_index".into(), Value::from(index));
        }
        if let Some(start) = chunk.start_paragraph {
            meta.insert("start_paragraph".into(), Value::from(start));
        }
        if let Some(end) = chunk.end_paragraph {
            meta.insert("end_paragraph".into(), Value::from(end));
        }
        if let Some(size) = chunk.size {
            meta.insert("size".into(), Value::from(size));
        }
        if let Some(chunk_size) = payload.chunk_size {
            meta.insert("chunk_size".into(), Value::from(chunk_size));
        }
        if let Some(total) = payload.paragraph_count {
            meta.insert("paragraph_count_total".into(), Value::from(total));
        }
        meta
    }
}
