use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Location of the upstream chunking service.
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Full URL of the chunks endpoint, e.g. `http://instructions:8080/chunks`.
    #[serde(default = "default_chunks_url")]
    pub chunks_url: String,
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
}

/// Location and collection of the vector store.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
}

/// Embedding function bound to the collection at creation time.
///
/// The embedding itself runs inside the vector store; this service never
/// computes a vector.
#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_chunks_url() -> String {
    "http://instructions:8080/chunks".to_string()
}
fn default_upstream_timeout_secs() -> u64 {
    10
}
fn default_store_url() -> String {
    "http://chroma:8080".to_string()
}
fn default_collection() -> String {
    "my_collection".to_string()
}
fn default_store_timeout_secs() -> u64 {
    30
}
fn default_embedding_url() -> String {
    "http://ollama-embedding:8080/api/embeddings".to_string()
}
fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            chunks_url: default_chunks_url(),
            timeout_secs: default_upstream_timeout_secs(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            collection: default_collection(),
            timeout_secs: default_store_timeout_secs(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            model: default_embedding_model(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.store.collection.is_empty() {
        anyhow::bail!("store.collection must not be empty");
    }

    if config.upstream.timeout_secs == 0 || config.store.timeout_secs == 0 {
        anyhow::bail!("timeout_secs must be > 0 (unbounded waits are not allowed)");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.store.collection, "my_collection");
        assert_eq!(config.upstream.timeout_secs, 10);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [store]
            url = "http://localhost:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.url, "http://localhost:9000");
        assert_eq!(config.store.collection, "my_collection");
    }
}
