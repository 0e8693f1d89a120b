//! HTTP transport: upload a work order PDF, get the redacted PDF back.
//!
//! - POST /redact_pdf - multipart form with a `file` field
//! - GET /health - liveness check
//!
//! Each request stages its upload and its output in temporary files that it
//! alone owns. Both are [`NamedTempFile`]s, so they are deleted when the
//! request's processing returns, whether it succeeded or not.
//!
//! Uploads run on the blocking pool. [`RedactionService::process`] holds the
//! process-wide MuPDF lock, so concurrent uploads queue for the PDF work
//! while their staging and response bodies proceed in parallel.

use crate::error::{RedactorError, RedactorResult};
use crate::redaction::RedactionService;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File name the redacted document is offered under.
pub const DOWNLOAD_NAME: &str = "redacted_output.pdf";

#[derive(Clone)]
struct AppState {
    service: Arc<RedactionService>,
}

// ============================================================================
// Error type
// ============================================================================

struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({"error": self.1}))).into_response()
    }
}

impl From<RedactorError> for AppError {
    fn from(err: RedactorError) -> Self {
        match err {
            RedactorError::InvalidInput { reason, .. } => bad_request(reason),
            other => {
                error!(error = %other, "Processing failed");
                AppError(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        }
    }
}

fn bad_request(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::BAD_REQUEST, msg.into())
}

// ============================================================================
// Routes
// ============================================================================

/// Builds the router. Uploads larger than `max_upload_bytes` are rejected with 413.
pub fn router(service: RedactionService, max_upload_bytes: usize) -> Router {
    let state = AppState {
        service: Arc::new(service),
    };

    Router::new()
        .route("/redact_pdf", post(redact_pdf))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until Ctrl-C.
pub async fn serve(
    bind: &str,
    service: RedactionService,
    max_upload_bytes: usize,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, router(service, max_upload_bytes))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok", "version": VERSION}))
}

async fn redact_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| bad_request(e.body_text()))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| bad_request("No file provided"))?;
    validate_filename(&filename)?;
    info!(%filename, bytes = data.len(), "Received upload");

    let service = Arc::clone(&state.service);
    let pdf = tokio::task::spawn_blocking(move || process_upload(&service, &data))
        .await
        .map_err(|e| AppError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DOWNLOAD_NAME),
            ),
        ],
        pdf,
    )
        .into_response())
}

/// Only files named `*.pdf` are accepted.
pub fn validate_filename(filename: &str) -> RedactorResult<()> {
    if filename.ends_with(".pdf") {
        Ok(())
    } else {
        Err(RedactorError::InvalidInput {
            parameter: "file".to_string(),
            reason: "File must be a PDF".to_string(),
        })
    }
}

/// Runs the full pipeline on an uploaded document and returns the redacted bytes.
///
/// The staged input and output are removed before this returns, on every path.
pub fn process_upload(service: &RedactionService, bytes: &[u8]) -> RedactorResult<Vec<u8>> {
    let mut input = staging_file()?;
    input.write_all(bytes)?;
    input.flush()?;
    let output = staging_file()?;

    let outcome = service.process(input.path(), output.path())?;
    info!(
        header = %serde_json::to_string(&outcome.output.header).unwrap_or_default(),
        units = %serde_json::to_string(&outcome.output.units).unwrap_or_default(),
        "Work order records"
    );

    std::fs::read(output.path()).map_err(|e| RedactorError::Io {
        path: output.path().to_path_buf(),
        source: e,
    })
}

fn staging_file() -> RedactorResult<NamedTempFile> {
    tempfile::Builder::new()
        .prefix("workorder-")
        .suffix(".pdf")
        .tempfile()
        .map_err(RedactorError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("order.pdf").is_ok());
        assert!(validate_filename("order.PDF").is_err());
        assert!(validate_filename("order.txt").is_err());
        assert!(validate_filename("").is_err());
    }

    #[test]
    fn test_bad_request_on_validation_error() {
        let err = validate_filename("notes.docx").unwrap_err();
        let AppError(status, message) = AppError::from(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "File must be a PDF");
    }

    #[test]
    fn test_garbage_upload_fails_and_leaves_no_files() {
        let service = RedactionService::default();
        let before = count_staged();
        assert!(process_upload(&service, b"not a pdf").is_err());
        assert_eq!(count_staged(), before);
    }

    fn count_staged() -> usize {
        std::fs::read_dir(std::env::temp_dir())
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.file_name().to_string_lossy().starts_with("workorder-"))
                    .count()
            })
            .unwrap_or(0)
    }
}
