//! Error taxonomy for the ingestion and introspection paths.
//!
//! Each variant corresponds to one HTTP status the server reports:
//! unreachable/bad upstream → 502, upstream timeout → 504, store failures
//! → 500. Upstream errors always carry the offending URL so operators can
//! diagnose from the response body alone.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Network or connect failure reaching the chunking service.
    #[error("failed to reach chunking service at {url}: {details}")]
    UpstreamUnreachable { url: String, details: String },

    /// The chunking service did not answer within the configured timeout.
    #[error("chunking service at {url} timed out after {timeout_secs}s")]
    UpstreamTimeout { url: String, timeout_secs: u64 },

    /// The chunking service answered with a non-2xx status or a non-JSON body.
    #[error("bad response from chunking service at {url}: {details}")]
    UpstreamBadResponse { url: String, details: String },

    /// Every applicable write tier failed.
    #[error("vector store write failed for collection '{collection}': {details}")]
    StoreWriteFailure { collection: String, details: String },

    /// The store's count or get primitive failed.
    #[error("vector store read failed: {details}")]
    StoreReadFailure { details: String },
}
