//! Video upload and scan endpoint

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;
use crate::error::ProcessError;
use crate::pipeline::ScanReport;
use crate::storage::{TempUpload, UploadStore};

const FILE_FIELD: &str = "file";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload-video", post(upload_video))
        .route("/upload-video/", post(upload_video))
}

#[derive(Serialize)]
struct UploadResponse {
    status: &'static str,
    message: &'static str,
    #[serde(flatten)]
    report: ScanReport,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

async fn upload_video(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let upload = match receive(&state.uploads, multipart).await {
        Ok(upload) => upload,
        Err(e) => return error_response(e),
    };

    tracing::info!(bytes = upload.bytes(), "video received");

    let result = state
        .pipeline
        .process(state.opener.as_ref(), upload.path())
        .await;
    upload.remove();

    match result {
        Ok(report) => Json(UploadResponse {
            status: "success",
            message: "Video processed.",
            report,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Stream the `file` field into scoped storage.
async fn receive(store: &UploadStore, mut multipart: Multipart) -> Result<TempUpload, ProcessError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let mut upload = store.begin(field.file_name()).await?;
        while let Some(chunk) = field.chunk().await? {
            upload.write_chunk(&chunk).await?;
        }
        upload.finish().await?;

        if upload.bytes() == 0 {
            return Err(ProcessError::BadUpload("uploaded file is empty".to_string()));
        }
        return Ok(upload);
    }

    Err(ProcessError::BadUpload(format!(
        "missing multipart field {:?}",
        FILE_FIELD
    )))
}

fn status_for(error: &ProcessError) -> StatusCode {
    match error {
        ProcessError::BadUpload(_) => StatusCode::BAD_REQUEST,
        ProcessError::Multipart(e) => e.status(),
        ProcessError::Source(_) | ProcessError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: ProcessError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!(%status, "video upload failed: {}", error);
    } else {
        tracing::warn!(%status, "video upload rejected: {}", error);
    }

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}
