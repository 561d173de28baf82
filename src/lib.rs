//! # Chunk Relay
//!
//! An ingestion relay between an upstream document-chunking service and a
//! vector store. Chunks are fetched over HTTP, given deterministic ids, and
//! written idempotently so re-ingesting a source never duplicates documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   GET /chunks    ┌─────────────┐   upsert/add    ┌──────────┐
//! │  Chunking    │◀─────────────────│ Chunk Relay │────────────────▶│  Vector  │
//! │  service     │                  │  (this)     │                 │  store   │
//! └──────────────┘                  └─────────────┘                 └──────────┘
//!                                         ▲
//!                         /populate  /stats  /remote-chunks
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Upstream payload and ingest record types |
//! | [`identity`] | Deterministic chunk-id derivation |
//! | [`error`] | Error taxonomy |
//! | [`chunks_client`] | Upstream chunking-service client |
//! | [`store`] | Vector-store trait, Chroma client, in-memory test store |
//! | [`ingest`] | Ingestion coordinator with tiered writes |
//! | [`stats`] | Read-side corpus introspection |
//! | [`server`] | Axum HTTP API |

pub mod chunks_client;
pub mod config;
pub mod error;
pub mod identity;
pub mod ingest;
pub mod models;
pub mod server;
pub mod stats;
pub mod store;
