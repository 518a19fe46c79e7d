//! Upload-and-process endpoint.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use gazette_core::Error;
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ocr", post(upload_and_process))
}

/// POST /api/ocr: multipart `file` plus optional `newspaper_name`.
///
/// The upload is saved under `raw/`, processed on a blocking thread, and
/// removed again if processing fails.
async fn upload_and_process(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<serde_json::Value>> {
    let mut upload: Option<(String, Bytes)> = None;
    let mut newspaper_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Input(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Input(format!("could not read upload: {}", e)))?;
                upload = Some((filename, bytes));
            }
            Some("newspaper_name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::Input(format!("could not read newspaper_name: {}", e)))?;
                newspaper_name = Some(text);
            }
            _ => {}
        }
    }

    let (filename, bytes) = upload.ok_or_else(|| Error::Input("no file part in request".into()))?;
    if filename.trim().is_empty() {
        return Err(Error::Input("no file selected".into()).into());
    }
    if bytes.is_empty() {
        return Err(Error::Input(format!("uploaded file is empty: {}", filename)).into());
    }

    let safe_name = sanitize_filename(&filename);
    let saved = unique_upload_path(&state.config.data_paths.raw, &safe_name);
    tokio::fs::write(&saved, &bytes).await.map_err(Error::from)?;
    info!("Saved upload {} ({} bytes)", saved.display(), bytes.len());

    let display_name = newspaper_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| stem(&safe_name));

    let task_state = state.clone();
    let task_path = saved.clone();
    let result = tokio::task::spawn_blocking(move || {
        task_state
            .pipeline
            .process_document(&task_state.store, &task_path, Some(&display_name))
    })
    .await
    .map_err(|e| Error::Internal(format!("processing task failed: {}", e)))
    .and_then(|r| r);

    match result {
        Ok(newspaper_id) => Ok(Json(serde_json::json!({
            "success": true,
            "newspaper_id": newspaper_id,
            "message": "processing completed",
        }))),
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&saved).await {
                warn!("Could not remove {}: {}", saved.display(), rm);
            }
            Err(e.into())
        }
    }
}

/// Strip directory components from a client-supplied filename.
fn sanitize_filename(name: &str) -> String {
    let name = name.replace(['/', '\\'], "").replace("..", "");
    Path::new(&name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("upload")
        .to_string()
}

/// `raw/<YYYYmmddHHMMSS>_<name>`, with a counter if that is taken.
fn unique_upload_path(raw_dir: &Path, safe_name: &str) -> PathBuf {
    let ts = chrono::Local::now().format("%Y%m%d%H%M%S");
    let mut candidate = raw_dir.join(format!("{}_{}", ts, safe_name));
    let mut n = 1;
    while candidate.exists() {
        candidate = raw_dir.join(format!("{}_{}_{}", ts, n, safe_name));
        n += 1;
    }
    candidate
}

fn stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .to_string()
}
