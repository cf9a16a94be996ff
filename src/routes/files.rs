use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::post,
    Router,
};
use tracing::info;
use uuid::Uuid;

use crate::documents::guess_content_type;
use crate::models::{AppState, UploadedDocument};
use crate::routes::ui::{back_to, PageResult};
use crate::session::SessionEvent;
use crate::types::AppError;

/// Largest accepted upload body
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sessions/{id}/upload", post(upload_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn upload_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> PageResult {
    // Reject unknown sessions before reading the body
    state.sessions.get(id).await?;

    match read_upload(multipart).await? {
        Some(document) => {
            info!(
                session_id = %id,
                filename = %document.filename,
                content_type = %document.content_type,
                size = document.data.len(),
                "File upload received"
            );
            state
                .sessions
                .dispatch(id, SessionEvent::Upload(document), &state.experts)
                .await?;
        }
        None => info!(session_id = %id, "Upload form submitted without a file"),
    }

    Ok(back_to(id))
}

/// Pull the `file` field out of the form; `None` when no file was chosen
async fn read_upload(mut multipart: Multipart) -> Result<Option<UploadedDocument>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("invalid upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let declared = field
            .content_type()
            .map(|ct| ct.to_string())
            .filter(|ct| !ct.trim().is_empty());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(format!("invalid upload: {}", e)))?;

        if filename.is_empty() && data.is_empty() {
            return Ok(None);
        }

        let content_type = declared.unwrap_or_else(|| guess_content_type(&filename));
        return Ok(Some(UploadedDocument {
            filename,
            content_type,
            data: data.to_vec(),
        }));
    }

    Ok(None)
}
