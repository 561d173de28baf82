//! HTTP API for the ingestion relay.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET\|POST` | `/populate` | Fetch, transform, and store chunks for a source |
//! | `GET` | `/stats` | Corpus count plus a small record sample |
//! | `GET` | `/remote-chunks` | Raw passthrough to the chunking service |
//! | `GET` | `/health` | Health check (returns version) |
//!
//! # Error contract
//!
//! ```json
//! { "error": { "code": "upstream_timeout", "message": "..." } }
//! ```
//!
//! Upstream unreachable / bad response → 502, upstream timeout → 504,
//! store failures → 500. `/populate` accepts `url` and `size` via query
//! string or JSON body; the query string wins per field.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted: the service runs inside
//! a trusted compose network and browser-based dashboards call it directly.

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::chunks_client::ChunkSource;
use crate::config::Config;
use crate::error::IngestError;
use crate::ingest::{run_populate, PopulateParams};
use crate::stats::collect_stats;
use crate::store::VectorStore;

/// Shared application state. All handles are created once at startup and
/// shared read-only across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn VectorStore>,
    pub chunks: Arc<dyn ChunkSource>,
}

/// Build the router with all routes and middleware attached.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/populate", get(handle_populate_get).post(handle_populate_post))
        .route("/stats", get(handle_stats))
        .route("/remote-chunks", get(handle_remote_chunks))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process is terminated.
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let bind_addr = state.config.server.bind.clone();
    let router = app(state);

    tracing::info!("listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g. `"upstream_timeout"`).
    code: String,
    /// Human-readable error message, including the upstream URL where relevant.
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        let (status, code) = match &err {
            IngestError::UpstreamUnreachable { .. } => {
                (StatusCode::BAD_GATEWAY, "upstream_unreachable")
            }
            IngestError::UpstreamTimeout { .. } => {
                (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout")
            }
            IngestError::UpstreamBadResponse { .. } => {
                (StatusCode::BAD_GATEWAY, "upstream_bad_response")
            }
            IngestError::StoreWriteFailure { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "store_write_failure")
            }
            IngestError::StoreReadFailure { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "store_read_failure")
            }
        };

        AppError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET|POST /populate ============

async fn handle_populate_get(
    State(state): State<AppState>,
    Query(params): Query<PopulateParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    populate(&state, params).await
}

/// POST variant: `url`/`size` may also arrive in a JSON body. The body is
/// parsed leniently (missing or malformed bodies act as empty) and the query
/// string takes precedence per field.
async fn handle_populate_post(
    State(state): State<AppState>,
    Query(query): Query<PopulateParams>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let body_params: PopulateParams = serde_json::from_slice(&body).unwrap_or_default();
    populate(&state, PopulateParams::merged(query, body_params)).await
}

async fn populate(
    state: &AppState,
    params: PopulateParams,
) -> Result<Json<serde_json::Value>, AppError> {
    let report = run_populate(state.chunks.as_ref(), state.store.as_ref(), &params).await?;
    Ok(Json(serde_json::to_value(&report).unwrap_or_default()))
}

// ============ GET /stats ============

async fn handle_stats(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let report = collect_stats(state.store.as_ref()).await?;
    Ok(Json(serde_json::to_value(&report).unwrap_or_default()))
}

// ============ GET /remote-chunks ============

/// Pure passthrough: forwards all query parameters to the chunking service
/// and mirrors its status code, body bytes, and content-type unmodified.
async fn handle_remote_chunks(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let upstream = state.chunks.fetch_raw(&params).await?;

    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .content_type
        .unwrap_or_else(|| "application/json".to_string());

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(upstream.body))
        .map_err(|e| AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal",
            message: e.to_string(),
        })
}
