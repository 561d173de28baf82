//! Read-side introspection of the stored corpus.
//!
//! Counting and sampling are independent concerns: a failed sample fetch
//! degrades to a diagnostic note while the count still comes back, but a
//! failed count fails the whole call.

use serde::Serialize;
use serde_json::Value;

use crate::error::IngestError;
use crate::store::VectorStore;

/// Fixed sample size; kept tiny so responses stay small.
const SAMPLE_LIMIT: usize = 3;
/// Preview cap in characters, before the ellipsis marker.
const PREVIEW_MAX_CHARS: usize = 160;

/// A sampled stored document with a truncated text preview.
#[derive(Debug, Serialize)]
pub struct SampleDoc {
    pub id: String,
    pub preview: String,
    pub metadata: Value,
}

/// Response body of `GET /stats`.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub collection: String,
    pub total_docs: u64,
    pub sample: Vec<SampleDoc>,
    /// Set when the sample fetch failed and `sample` is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_note: Option<String>,
}

/// Truncate document text for display, appending `…` when capped.
fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_MAX_CHARS {
        let capped: String = text.chars().take(PREVIEW_MAX_CHARS).collect();
        format!("{}…", capped)
    } else {
        text.to_string()
    }
}

/// Collect corpus statistics: total count plus a bounded record sample.
pub async fn collect_stats(store: &dyn VectorStore) -> Result<StatsReport, IngestError> {
    let total_docs = store
        .count()
        .await
        .map_err(|e| IngestError::StoreReadFailure {
            details: format!("count: {}", e),
        })?;

    let (sample, sample_note) = match store.get(SAMPLE_LIMIT).await {
        Ok(records) => {
            let sample = records
                .into_iter()
                .map(|r| SampleDoc {
                    id: r.id,
                    preview: preview(r.document.as_deref().unwrap_or("")),
                    metadata: r.metadata,
                })
                .collect();
            (sample, None)
        }
        Err(e) => {
            tracing::warn!(error = %e, "sample fetch failed, degrading to count-only stats");
            (Vec::new(), Some(format!("sample unavailable: {}", e)))
        }
    };

    Ok(StatsReport {
        collection: store.collection_name().to_string(),
        total_docs,
        sample,
        sample_note,
    })
}
