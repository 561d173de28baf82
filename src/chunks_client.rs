//! Client for the upstream document-chunking service.
//!
//! Two access modes:
//! - [`ChunkSource::fetch_chunks`] — typed fetch used by the ingestion
//!   pipeline; non-2xx and non-JSON responses are errors.
//! - [`ChunkSource::fetch_raw`] — byte-level fetch used by the
//!   `/remote-chunks` passthrough, which mirrors whatever the upstream said
//!   (including error statuses) without interpretation.
//!
//! Every outbound call is bounded by the configured timeout; a slow upstream
//! can never hang a caller indefinitely.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::UpstreamConfig;
use crate::error::IngestError;
use crate::models::SourcePayload;

/// Raw upstream response, relayed verbatim by the passthrough route.
#[derive(Debug, Clone)]
pub struct RawUpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Source of chunked documents.
///
/// The ingestion coordinator depends on this trait rather than on a concrete
/// HTTP client so tests can substitute canned payloads and failures.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// Fetch and decode a chunked document.
    ///
    /// `url` and `size` are forwarded as query parameters when present;
    /// otherwise the upstream applies its own defaults.
    async fn fetch_chunks(
        &self,
        url: Option<&str>,
        size: Option<&str>,
    ) -> Result<SourcePayload, IngestError>;

    /// Fetch the upstream response without decoding, forwarding arbitrary
    /// query parameters.
    async fn fetch_raw(
        &self,
        params: &[(String, String)],
    ) -> Result<RawUpstreamResponse, IngestError>;
}

/// Reqwest-backed [`ChunkSource`] talking to the configured chunks endpoint.
pub struct HttpChunkSource {
    client: reqwest::Client,
    chunks_url: String,
    timeout_secs: u64,
}

impl HttpChunkSource {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            chunks_url: config.chunks_url.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// The upstream endpoint this client targets.
    pub fn chunks_url(&self) -> &str {
        &self.chunks_url
    }

    fn classify_send_error(&self, err: reqwest::Error) -> IngestError {
        if err.is_timeout() {
            IngestError::UpstreamTimeout {
                url: self.chunks_url.clone(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            IngestError::UpstreamUnreachable {
                url: self.chunks_url.clone(),
                details: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl ChunkSource for HttpChunkSource {
    async fn fetch_chunks(
        &self,
        url: Option<&str>,
        size: Option<&str>,
    ) -> Result<SourcePayload, IngestError> {
        let mut request = self.client.get(&self.chunks_url);
        if let Some(url) = url {
            request = request.query(&[("url", url)]);
        }
        if let Some(size) = size {
            request = request.query(&[("size", size)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::UpstreamBadResponse {
                url: self.chunks_url.clone(),
                details: format!("status {}: {}", status, truncate_for_log(&body)),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                IngestError::UpstreamTimeout {
                    url: self.chunks_url.clone(),
                    timeout_secs: self.timeout_secs,
                }
            } else {
                IngestError::UpstreamUnreachable {
                    url: self.chunks_url.clone(),
                    details: e.to_string(),
                }
            }
        })?;

        serde_json::from_slice(&body).map_err(|e| IngestError::UpstreamBadResponse {
            url: self.chunks_url.clone(),
            details: format!(
                "invalid JSON ({}): {}",
                e,
                truncate_for_log(&String::from_utf8_lossy(&body))
            ),
        })
    }

    async fn fetch_raw(
        &self,
        params: &[(String, String)],
    ) -> Result<RawUpstreamResponse, IngestError> {
        let response = self
            .client
            .get(&self.chunks_url)
            .query(params)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify_send_error(e))?
            .to_vec();

        Ok(RawUpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Cap upstream body text echoed into error details.
fn truncate_for_log(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let capped: String = body.chars().take(MAX).collect();
        format!("{}…", capped)
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_bodies_in_error_details() {
        let long = "x".repeat(500);
        let capped = truncate_for_log(&long);
        assert!(capped.ends_with('…'));
        assert_eq!(capped.chars().count(), 201);
    }

    #[test]
    fn short_bodies_pass_through() {
        assert_eq!(truncate_for_log("oops"), "oops");
    }
}
