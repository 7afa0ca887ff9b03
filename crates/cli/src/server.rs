//! HTTP surface: upload, search, stats and health routes over a shared store.

use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use docsearch_core::error::SearchError;
use docsearch_core::models::{Category, FileInput, QueryRequest};
use docsearch_core::pipeline::{self, Services};
use docsearch_core::search;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self {
            services: Arc::new(services),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::InvalidRequest(msg) => ApiError::bad_request(msg),
            SearchError::SearchFailed(err) => ApiError::internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = %self.detail, "request failed");
        }
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/documents", post(upload_documents))
        .route("/search", get(search_documents))
        .route("/stats", get(stats))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves until Ctrl-C, then closes the store.
pub async fn serve(state: AppState, bind: &str, max_upload_bytes: usize) -> anyhow::Result<()> {
    use anyhow::Context;

    let store = Arc::clone(&state.services.store);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {}", bind))?;
    info!(addr = %listener.local_addr()?, backend = store.backend(), "http server listening");
    axum::serve(listener, router(state, max_upload_bytes))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .context("http server")?;
    store.close().await;
    info!("store closed");
    Ok(())
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "docsearch",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /documents",
            "search": "GET /search",
            "stats": "GET /stats",
            "health": "GET /health"
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "storage": state.services.store.backend(),
    }))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let stats = state
        .services
        .store
        .get_stats()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(json!({ "statistics": stats })))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Required; an explicit empty value matches every document.
    pub query: Option<String>,
    pub category: Option<String>,
    pub filename: Option<String>,
    /// Kept as text so a malformed value gets our own 400 body.
    pub limit: Option<String>,
}

impl SearchParams {
    fn into_request(self, default_limit: usize) -> Result<QueryRequest, ApiError> {
        let query = self
            .query
            .ok_or_else(|| ApiError::bad_request("query is required"))?;
        let limit = match self.limit.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                ApiError::bad_request(format!("limit must be a positive integer, got {:?}", raw))
            })?),
        };
        let mut request = QueryRequest::new(query).limit(search::parse_limit(limit, default_limit)?);
        if let Some(raw) = self.category.filter(|c| !c.trim().is_empty()) {
            let category: Category = raw.parse().map_err(|e| ApiError::bad_request(format!("{}", e)))?;
            request = request.category(category);
        }
        if let Some(filename) = self.filename.filter(|f| !f.is_empty()) {
            request = request.filename(filename);
        }
        Ok(request)
    }
}

pub async fn search_documents(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let request = params.into_request(state.services.default_limit)?;
    let results = search::search(state.services.store.as_ref(), &request).await?;
    Ok(Json(json!({ "results": results })))
}

/// Every multipart part carrying a filename is treated as an uploaded file.
pub async fn upload_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let staging = tempfile::tempdir().map_err(|e| ApiError::internal(format!("staging dir: {}", e)))?;
    let mut batch = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("reading {}: {}", filename, e)))?;
        let path = staging.path().join(staged_name(batch.len(), &filename));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ApiError::internal(format!("staging {}: {}", filename, e)))?;
        debug!(%filename, bytes = bytes.len(), "staged upload");
        batch.push(FileInput::new(path, filename));
    }
    if batch.is_empty() {
        return Err(ApiError::bad_request("no files in request"));
    }

    let report = pipeline::ingest(&state.services, batch).await;
    let status = if report.store_error.is_some() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    Ok((status, Json(report)).into_response())
}

/// Index-prefixed final path component; never escapes the staging dir.
fn staged_name(index: usize, filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{:04}-{}", index, base)
}
