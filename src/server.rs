//! HTTP analysis API.
//!
//! Exposes the batch scoring engine over JSON for upload forms and other
//! HTTP clients.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/analyze/urls` | Score a comma/newline-delimited list of URLs |
//! | `POST` | `/analyze/files` | Score uploaded documents (multipart) |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Error responses use a machine-readable code plus a human-readable message:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "no URLs provided" } }
//! ```
//!
//! Only caller-input problems (no sources, unreadable request) surface as
//! HTTP errors. Per-source failures are reported inside the 200 response as
//! that source's error entry; the batch itself always completes.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! upload forms.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::batch::{parse_url_list, BatchResult, Engine, Source};
use crate::config::Config;
use crate::fetch::HttpFetcher;
use crate::glossary::Glossary;
use crate::mask::parse_ignore_phrases;

/// Largest accepted request body (uploads included).
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    engine: Engine,
}

/// Start the analysis server.
///
/// Loads the glossary once, compiles the matcher, and binds to the address
/// configured in `[server].bind`. Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let glossary = Glossary::load(&config.glossary.path)?;
    let fetcher = Arc::new(HttpFetcher::new(
        config.fetch.timeout_secs,
        &config.fetch.user_agent,
    )?);
    let engine = Engine::new(
        &glossary,
        config.matching.mode,
        fetcher,
        config.batch.max_concurrency,
    )?;

    let state = AppState { engine };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/analyze/urls", post(handle_analyze_urls))
        .route("/analyze/files", post(handle_analyze_files))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state);

    println!(
        "Analysis server listening on http://{} ({} glossary terms)",
        config.server.bind,
        glossary.len()
    );

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
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

// ============ POST /analyze/urls ============

/// Request body for URL analysis. `ignoreText` is accepted as an alias for
/// compatibility with older upload forms.
#[derive(Deserialize)]
struct AnalyzeUrlsRequest {
    urls: String,
    #[serde(default, alias = "ignoreText")]
    ignore_text: Option<String>,
}

async fn handle_analyze_urls(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeUrlsRequest>,
) -> Result<Json<BatchResult>, AppError> {
    let urls = parse_url_list(&request.urls);
    if urls.is_empty() {
        return Err(bad_request("no URLs provided"));
    }

    let ignore = parse_ignore_phrases(request.ignore_text.as_deref().unwrap_or(""));
    let sources = urls.into_iter().map(|url| Source::Url { url }).collect();
    let result = state.engine.run(sources, ignore).await;
    Ok(Json(result))
}

// ============ POST /analyze/files ============

async fn handle_analyze_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BatchResult>, AppError> {
    let mut sources: Vec<Source> = Vec::new();
    let mut ignore_block = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("malformed multipart request: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "docs" => {
                let name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or("unknown")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("failed to read upload '{}': {}", name, e)))?;
                sources.push(Source::Blob {
                    name,
                    bytes: bytes.to_vec(),
                });
            }
            "ignore_text" | "ignoreText" => {
                ignore_block = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("failed to read ignore text: {}", e)))?;
            }
            _ => {}
        }
    }

    if sources.is_empty() {
        return Err(bad_request("no files uploaded"));
    }

    let ignore = parse_ignore_phrases(&ignore_block);
    let result = state.engine.run(sources, ignore).await;
    Ok(Json(result))
}
