//! Vector-store abstraction.
//!
//! The [`VectorStore`] trait covers the write and read primitives the
//! pipeline needs, plus capability probes: not every backend or backend
//! version exposes upsert, so the coordinator asks before it writes instead
//! of discovering capabilities through failures.
//!
//! Implementations must be `Send + Sync`; handles are created once at startup
//! and shared read-only across requests.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`upsert`](VectorStore::upsert) | Insert-or-overwrite a batch by id |
//! | [`add`](VectorStore::add) | Plain insert; fails on existing ids |
//! | [`update`](VectorStore::update) | Overwrite existing records by id |
//! | [`get`](VectorStore::get) | Fetch a bounded sample of stored records |
//! | [`count`](VectorStore::count) | Total documents in the collection |

pub mod chroma;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A stored record as returned by [`VectorStore::get`].
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub document: Option<String>,
    pub metadata: Value,
}

/// Abstract vector-store backend.
///
/// All batch methods take index-aligned parallel slices: position `i` of
/// `ids`, `documents`, and `metadatas` always describes the same record.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Name of the collection this handle writes to.
    fn collection_name(&self) -> &str;

    /// Whether the backend exposes upsert-by-id semantics.
    fn supports_upsert(&self) -> bool;

    /// Whether the backend exposes an update-in-place operation.
    fn supports_update(&self) -> bool;

    /// Insert records, overwriting any that already exist under the same id.
    async fn upsert(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Map<String, Value>],
    ) -> Result<()>;

    /// Plain insert. Fails if any id already exists.
    async fn add(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Map<String, Value>],
    ) -> Result<()>;

    /// Overwrite existing records by id.
    async fn update(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Map<String, Value>],
    ) -> Result<()>;

    /// Fetch up to `limit` stored records, including text and metadata.
    async fn get(&self, limit: usize) -> Result<Vec<StoredDocument>>;

    /// Total number of documents in the collection.
    async fn count(&self) -> Result<u64>;
}
