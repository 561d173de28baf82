//! In-memory [`VectorStore`] implementation for testing.
//!
//! Backed by a `HashMap` behind `std::sync::RwLock`, with insertion order
//! tracked separately so [`get`](VectorStore::get) is deterministic.
//! Capability flags and failure switches are configurable so tests can walk
//! the coordinator through every write tier and every read degradation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{StoredDocument, VectorStore};

struct Record {
    document: String,
    metadata: Value,
}

/// Call counters, readable from tests.
#[derive(Default)]
pub struct WriteCounters {
    pub upsert_calls: AtomicUsize,
    pub add_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
}

/// In-memory store with configurable capabilities.
pub struct MemoryVectorStore {
    collection: String,
    records: RwLock<HashMap<String, Record>>,
    order: RwLock<Vec<String>>,
    upsert_supported: bool,
    update_supported: bool,
    fail_get: bool,
    fail_count: bool,
    pub counters: WriteCounters,
}

impl MemoryVectorStore {
    /// Fully-capable store (upsert available).
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            records: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
            upsert_supported: true,
            update_supported: true,
            fail_get: false,
            fail_count: false,
            counters: WriteCounters::default(),
        }
    }

    /// Store without upsert; `add` rejects duplicate ids, `update` works.
    pub fn without_upsert(collection: &str) -> Self {
        Self {
            upsert_supported: false,
            ..Self::new(collection)
        }
    }

    /// Store exposing only plain insert.
    pub fn insert_only(collection: &str) -> Self {
        Self {
            upsert_supported: false,
            update_supported: false,
            ..Self::new(collection)
        }
    }

    /// Make [`VectorStore::get`] fail, to exercise the stats degrade path.
    pub fn with_failing_get(mut self) -> Self {
        self.fail_get = true;
        self
    }

    /// Make [`VectorStore::count`] fail.
    pub fn with_failing_count(mut self) -> Self {
        self.fail_count = true;
        self
    }

    pub fn total_write_calls(&self) -> usize {
        self.counters.upsert_calls.load(Ordering::SeqCst)
            + self.counters.add_calls.load(Ordering::SeqCst)
            + self.counters.update_calls.load(Ordering::SeqCst)
    }

    fn write_all(&self, ids: &[String], documents: &[String], metadatas: &[Map<String, Value>]) {
        let mut records = self.records.write().unwrap();
        let mut order = self.order.write().unwrap();
        for ((id, doc), meta) in ids.iter().zip(documents).zip(metadatas) {
            if !records.contains_key(id) {
                order.push(id.clone());
            }
            records.insert(
                id.clone(),
                Record {
                    document: doc.clone(),
                    metadata: Value::Object(meta.clone()),
                },
            );
        }
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    fn collection_name(&self) -> &str {
        &self.collection
    }

    fn supports_upsert(&self) -> bool {
        self.upsert_supported
    }

    fn supports_update(&self) -> bool {
        self.update_supported
    }

    async fn upsert(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Map<String, Value>],
    ) -> Result<()> {
        self.counters.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if !self.upsert_supported {
            bail!("upsert not supported by this store");
        }
        self.write_all(ids, documents, metadatas);
        Ok(())
    }

    async fn add(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Map<String, Value>],
    ) -> Result<()> {
        self.counters.add_calls.fetch_add(1, Ordering::SeqCst);
        {
            let records = self.records.read().unwrap();
            if let Some(existing) = ids.iter().find(|id| records.contains_key(*id)) {
                bail!("id already exists: {}", existing);
            }
        }
        self.write_all(ids, documents, metadatas);
        Ok(())
    }

    async fn update(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Map<String, Value>],
    ) -> Result<()> {
        self.counters.update_calls.fetch_add(1, Ordering::SeqCst);
        if !self.update_supported {
            bail!("update not supported by this store");
        }
        {
            let records = self.records.read().unwrap();
            if let Some(missing) = ids.iter().find(|id| !records.contains_key(*id)) {
                bail!("cannot update missing id: {}", missing);
            }
        }
        self.write_all(ids, documents, metadatas);
        Ok(())
    }

    async fn get(&self, limit: usize) -> Result<Vec<StoredDocument>> {
        if self.fail_get {
            bail!("simulated get failure");
        }
        let records = self.records.read().unwrap();
        let order = self.order.read().unwrap();
        Ok(order
            .iter()
            .take(limit)
            .filter_map(|id| {
                records.get(id).map(|r| StoredDocument {
                    id: id.clone(),
                    document: Some(r.document.clone()),
                    metadata: r.metadata.clone(),
                })
            })
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        if self.fail_count {
            bail!("simulated count failure");
        }
        Ok(self.records.read().unwrap().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> (Vec<String>, Vec<String>, Vec<Map<String, Value>>) {
        (
            vec![id.to_string()],
            vec!["text".to_string()],
            vec![Map::new()],
        )
    }

    #[tokio::test]
    async fn add_rejects_duplicate_ids() {
        let store = MemoryVectorStore::new("c");
        let (ids, docs, metas) = record("a");
        store.add(&ids, &docs, &metas).await.unwrap();
        assert!(store.add(&ids, &docs, &metas).await.is_err());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upsert_overwrites_in_place() {
        let store = MemoryVectorStore::new("c");
        let (ids, docs, metas) = record("a");
        store.upsert(&ids, &docs, &metas).await.unwrap();
        store.upsert(&ids, &docs, &metas).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_requires_existing_ids() {
        let store = MemoryVectorStore::new("c");
        let (ids, docs, metas) = record("a");
        assert!(store.update(&ids, &docs, &metas).await.is_err());
    }

    #[tokio::test]
    async fn get_preserves_insertion_order() {
        let store = MemoryVectorStore::new("c");
        for id in ["first", "second", "third"] {
            let (ids, docs, metas) = record(id);
            store.add(&ids, &docs, &metas).await.unwrap();
        }
        let sample = store.get(2).await.unwrap();
        assert_eq!(sample.len(), 2);
        assert_eq!(sample[0].id, "first");
        assert_eq!(sample[1].id, "second");
    }
}
