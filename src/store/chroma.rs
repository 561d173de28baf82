//! Chroma-backed [`VectorStore`] over the HTTP v2 API.
//!
//! The collection is resolved once at startup via get-or-create, with the
//! embedding function bound server-side at creation time; this service only
//! ever ships raw document text. The resolved collection id is cached for
//! the life of the process.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::{EmbeddingConfig, StoreConfig};

use super::{StoredDocument, VectorStore};

#[derive(Debug, Serialize)]
struct BatchWriteRequest<'a> {
    ids: &'a [String],
    documents: &'a [String],
    metadatas: &'a [Map<String, Value>],
}

/// Long-lived Chroma client handle. Created once at startup, shared across
/// requests, never mutated.
pub struct ChromaStore {
    client: reqwest::Client,
    base_url: String,
    tenant: String,
    database: String,
    collection: String,
    collection_id: String,
}

impl ChromaStore {
    /// Connect to Chroma and get-or-create the configured collection.
    ///
    /// The embedding function (URL + model) is attached to the collection at
    /// creation; Chroma invokes it server-side whenever documents arrive
    /// without explicit embeddings.
    pub async fn connect(store: &StoreConfig, embedding: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(store.timeout_secs))
            .build()?;

        let mut this = Self {
            client,
            base_url: store.url.trim_end_matches('/').to_string(),
            tenant: "default_tenant".to_string(),
            database: "default_database".to_string(),
            collection: store.collection.clone(),
            collection_id: String::new(),
        };

        this.collection_id = this
            .ensure_collection(embedding)
            .await
            .with_context(|| format!("failed to get-or-create collection '{}'", store.collection))?;

        tracing::info!(
            collection = %this.collection,
            collection_id = %this.collection_id,
            "connected to vector store"
        );

        Ok(this)
    }

    fn collections_url(&self) -> String {
        format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            self.base_url, self.tenant, self.database
        )
    }

    fn operation_url(&self, operation: &str) -> String {
        format!("{}/{}/{}", self.collections_url(), self.collection_id, operation)
    }

    /// Get-or-create the collection and return its id.
    async fn ensure_collection(&self, embedding: &EmbeddingConfig) -> Result<String> {
        let body = json!({
            "name": self.collection,
            "get_or_create": true,
            "metadata": { "hnsw:space": "cosine" },
            "configuration": {
                "embedding_function": {
                    "name": "ollama",
                    "config": {
                        "url": embedding.url,
                        "model_name": embedding.model,
                    }
                }
            }
        });

        let response = self
            .client
            .post(self.collections_url())
            .json(&body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let collection: Value = response.json().await?;
                collection
                    .get("id")
                    .and_then(|id| id.as_str())
                    .map(|id| id.to_string())
                    .ok_or_else(|| anyhow::anyhow!("collection response missing id"))
            }
            status => {
                let message = response.text().await.unwrap_or_default();
                bail!("vector store error {}: {}", status, message)
            }
        }
    }

    async fn write_batch(
        &self,
        operation: &str,
        ids: &[String],
        documents: &[String],
        metadatas: &[Map<String, Value>],
    ) -> Result<()> {
        let request = BatchWriteRequest {
            ids,
            documents,
            metadatas,
        };

        let response = self
            .client
            .post(self.operation_url(operation))
            .json(&request)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                tracing::debug!(operation, count = ids.len(), "vector store write ok");
                Ok(())
            }
            status => {
                let message = response.text().await.unwrap_or_default();
                bail!("{} failed with status {}: {}", operation, status, message)
            }
        }
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    fn collection_name(&self) -> &str {
        &self.collection
    }

    // The v2 API carries both primitives; older servers without them get the
    // insert/update tiers instead.
    fn supports_upsert(&self) -> bool {
        true
    }

    fn supports_update(&self) -> bool {
        true
    }

    async fn upsert(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Map<String, Value>],
    ) -> Result<()> {
        self.write_batch("upsert", ids, documents, metadatas).await
    }

    async fn add(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Map<String, Value>],
    ) -> Result<()> {
        self.write_batch("add", ids, documents, metadatas).await
    }

    async fn update(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Map<String, Value>],
    ) -> Result<()> {
        self.write_batch("update", ids, documents, metadatas).await
    }

    async fn get(&self, limit: usize) -> Result<Vec<StoredDocument>> {
        let body = json!({
            "limit": limit,
            "include": ["documents", "metadatas"],
        });

        let response = self
            .client
            .post(self.operation_url("get"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            bail!("get failed with status {}: {}", status, message);
        }

        let parsed: Value = response.json().await?;
        let ids = parsed
            .get("ids")
            .and_then(|v| v.as_array())
            .ok_or_else(|| anyhow::anyhow!("get response missing ids"))?;
        let documents = parsed.get("documents").and_then(|v| v.as_array());
        let metadatas = parsed.get("metadatas").and_then(|v| v.as_array());

        let mut records = Vec::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            let Some(id) = id.as_str() else { continue };
            let document = documents
                .and_then(|d| d.get(i))
                .and_then(|d| d.as_str())
                .map(|d| d.to_string());
            let metadata = metadatas
                .and_then(|m| m.get(i))
                .cloned()
                .unwrap_or(Value::Null);
            records.push(StoredDocument {
                id: id.to_string(),
                document,
                metadata,
            });
        }

        Ok(records)
    }

    async fn count(&self) -> Result<u64> {
        let response = self
            .client
            .get(self.operation_url("count"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            bail!("count failed with status {}: {}", status, message);
        }

        Ok(response.json::<u64>().await?)
    }
}
