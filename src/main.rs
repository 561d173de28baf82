//! # Chunk Relay server binary
//!
//! Loads configuration, connects to the vector store (get-or-create of the
//! configured collection happens here, once), and serves the HTTP API.
//!
//! ```bash
//! chunk-relay --config ./config/relay.toml
//! chunk-relay            # built-in defaults (compose-network hostnames)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use chunk_relay::chunks_client::HttpChunkSource;
use chunk_relay::config::{load_config, Config};
use chunk_relay::server::{run_server, AppState};
use chunk_relay::store::chroma::ChromaStore;

/// Chunk ingestion relay between a document-chunking service and a vector store.
#[derive(Parser)]
#[command(name = "chunk-relay", version)]
struct Cli {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bind address from the config.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    let chunks = HttpChunkSource::new(&config.upstream)?;
    let store = ChromaStore::connect(&config.store, &config.embedding).await?;

    let state = AppState {
        config: Arc::new(config),
        store: Arc::new(store),
        chunks: Arc::new(chunks),
    };

    run_server(state).await
}
