use std::path::Path;

use axum::{
    extract::{Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use super::AppState;
use crate::discovery::{self, ENTRY_POINT, MANIFEST_FILE, STYLESHEET};

/// Prefix shared by the viewer's script and stylesheet.
const VIEWER_PREFIX: &str = "/viewer.";

// ============================================================
// Error Handling
// ============================================================

fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn json_response(body: impl Into<Vec<u8>>) -> Response {
    ([(CONTENT_TYPE, "application/json")], body.into()).into_response()
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// Read a file into a response, or 404 if it cannot be read.
async fn send_file(path: &Path) -> Result<Response, StatusCode> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(([(CONTENT_TYPE, content_type_for(path))], bytes).into_response()),
        Err(e) => {
            tracing::debug!("Not serving {}: {}", path.display(), e);
            Err(StatusCode::NOT_FOUND)
        }
    }
}

// ============================================================
// Manifest
// ============================================================

/// Serve the built manifest if there is one, otherwise list the notes root.
pub async fn files_json(state: State<AppState>) -> Result<Response, (StatusCode, String)> {
    let prebuilt = state.public_dir.join(MANIFEST_FILE);
    if prebuilt.is_file() {
        match tokio::fs::read(&prebuilt).await {
            Ok(bytes) => return Ok(json_response(bytes)),
            Err(e) => tracing::warn!("Failed to read {}: {}", prebuilt.display(), e),
        }
    }
    list_files(state).await
}

/// Freshly scanned, sorted document list. Never written to disk.
pub async fn list_files(
    State(state): State<AppState>,
) -> Result<Response, (StatusCode, String)> {
    let manifest = discovery::discover_or_empty(&state.notes_dir).manifest();
    let body = manifest.to_compact_json().map_err(internal_error)?;
    Ok(json_response(body))
}

// ============================================================
// Change Detection
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatus {
    pub updated: bool,
    /// Server time in seconds since the epoch.
    pub timestamp: f64,
}

pub async fn check_updates(State(state): State<AppState>) -> Json<UpdateStatus> {
    let updated = state.monitor.check_for_changes(&state.notes_dir);
    Json(UpdateStatus {
        updated,
        timestamp: state.clock.now(),
    })
}

// ============================================================
// Viewer Resources
// ============================================================

pub async fn entry_page(State(state): State<AppState>) -> Result<Response, StatusCode> {
    send_file(&state.viewer_dir.join(ENTRY_POINT)).await
}

pub async fn stylesheet(State(state): State<AppState>) -> Result<Response, StatusCode> {
    send_file(&state.notes_dir.join(STYLESHEET)).await
}

async fn viewer_asset(state: &AppState, suffix: &str) -> Result<Response, StatusCode> {
    if suffix.is_empty() || suffix.contains(['/', '\\']) || suffix.contains("..") {
        return Err(StatusCode::NOT_FOUND);
    }
    send_file(&state.viewer_dir.join(format!("viewer.{suffix}"))).await
}

/// `/viewer.*` comes from the viewer dir; everything else is served
/// statically from the notes root.
pub async fn fallback(State(state): State<AppState>, request: Request) -> Response {
    if let Some(suffix) = request.uri().path().strip_prefix(VIEWER_PREFIX) {
        return viewer_asset(&state, suffix).await.into_response();
    }

    match ServeDir::new(&state.notes_dir).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for(Path::new("viewer.js")), "application/javascript");
        assert_eq!(content_type_for(Path::new("viewer.css")), "text/css");
        assert_eq!(content_type_for(Path::new("index.html")), "text/html");
        assert_eq!(content_type_for(Path::new("viewer.map")), "application/octet-stream");
    }
}
