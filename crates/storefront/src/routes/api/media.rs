//! `/api/media` - multipart uploads and metadata edits.

use axum::{
    extract::{Multipart, Path, State, multipart::MultipartError},
    response::{IntoResponse, Response},
};
use cartwright_core::MediaId;

use super::{ApiJson, Deleted, Doc, Docs};
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::MediaPatch;
use crate::services::media::{MediaService, Upload};
use crate::state::AppState;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        Self::BadRequest(e.body_text())
    }
}

/// Collect the `file`, `altText` and `caption` parts.
async fn read_upload(mut multipart: Multipart) -> Result<Upload> {
    let mut upload = Upload::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                upload.filename = field.file_name().unwrap_or("upload").to_owned();
                upload.content_type = field.content_type().unwrap_or_default().to_owned();
                upload.bytes = field.bytes().await?.to_vec();
            }
            Some("altText") => upload.alt_text = Some(field.text().await?),
            Some("caption") => upload.caption = Some(field.text().await?),
            _ => {}
        }
    }
    Ok(upload)
}

pub async fn upload(
    State(state): State<AppState>,
    auth: OptionalAuth,
    multipart: Multipart,
) -> Result<Response> {
    let upload = read_upload(multipart).await?;
    let media = MediaService::new(state.store(), &state.config().media_dir)
        .upload(auth.principal(), upload)
        .await?;
    Ok(Doc::created(media))
}

pub async fn list(State(state): State<AppState>) -> Result<Response> {
    let media = MediaService::new(state.store(), &state.config().media_dir)
        .list()
        .await?;
    Ok(Docs::from(media).into_response())
}

pub async fn show(State(state): State<AppState>, Path(id): Path<MediaId>) -> Result<Response> {
    let media = MediaService::new(state.store(), &state.config().media_dir)
        .get(id)
        .await?;
    Ok(Doc { doc: media }.into_response())
}

pub async fn update(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<MediaId>,
    ApiJson(patch): ApiJson<MediaPatch>,
) -> Result<Response> {
    let media = MediaService::new(state.store(), &state.config().media_dir)
        .update(auth.principal(), id, patch)
        .await?;
    Ok(Doc { doc: media }.into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<MediaId>,
) -> Result<Response> {
    let id = MediaService::new(state.store(), &state.config().media_dir)
        .delete(auth.principal(), id)
        .await?;
    Ok(Deleted { id }.into_response())
}
