//! Upload request handlers.
//!
//! The wire format follows the browser upload widget this API serves:
//! multipart/form-data with `qq`-prefixed metadata fields, `{"success":true}`
//! on success, and `{"error", "preventRetry", "reset"}` on failure.

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Form, Multipart, Path, State};
use gantry_core::{ChunkUpload, FileUpload, UploadId};
use gantry_storage::ChunkOutcome;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Multipart field names used by the upload widget.
mod fields {
    pub const FILE: &str = "qqfile";
    pub const UUID: &str = "qquuid";
    pub const FILE_NAME: &str = "qqfilename";
    pub const TOTAL_SIZE: &str = "qqtotalfilesize";
    pub const PART_INDEX: &str = "qqpartindex";
    pub const TOTAL_PARTS: &str = "qqtotalparts";
}

/// Parsed multipart upload request.
#[derive(Debug, Default)]
struct UploadForm {
    uuid: Option<String>,
    file_name: Option<String>,
    total_size: Option<u64>,
    part_index: Option<u32>,
    total_parts: Option<u32>,
    /// Path the file part's bytes were staged to.
    staged: Option<PathBuf>,
    /// File name from the file part itself, used when qqfilename is absent.
    part_file_name: Option<String>,
}

impl UploadForm {
    fn uuid(&self) -> ApiResult<UploadId> {
        let raw = self
            .uuid
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest(format!("missing {} field", fields::UUID)))?;
        Ok(UploadId::parse(raw)?)
    }

    fn file_name(&self) -> ApiResult<&str> {
        self.file_name
            .as_deref()
            .or(self.part_file_name.as_deref())
            .ok_or_else(|| ApiError::BadRequest("missing file name".to_string()))
    }

    fn staged(&self) -> ApiResult<&std::path::Path> {
        self.staged
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest(format!("missing {} field", fields::FILE)))
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> ApiResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {name}: {raw}")))
}

/// Read the multipart request, streaming the file part to the staging area.
///
/// If parsing fails after the file part was staged, the staged payload is
/// removed before the error propagates; nothing else will ever reclaim it.
async fn read_form(state: &AppState, multipart: &mut Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();
    if let Err(e) = fill_form(state, multipart, &mut form).await {
        if let Some(staged) = &form.staged {
            let _ = fs::remove_file(staged).await;
        }
        return Err(e);
    }
    Ok(form)
}

async fn fill_form(
    state: &AppState,
    multipart: &mut Multipart,
    form: &mut UploadForm,
) -> ApiResult<()> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some(fields::FILE) => {
                form.part_file_name = field.file_name().map(|s| s.to_string());
                form.staged = Some(stage_field(state, &mut field).await?);
            }
            Some(fields::UUID) => form.uuid = Some(read_text(field).await?),
            Some(fields::FILE_NAME) => form.file_name = Some(read_text(field).await?),
            Some(fields::TOTAL_SIZE) => {
                let raw = read_text(field).await?;
                form.total_size = Some(parse_number(fields::TOTAL_SIZE, &raw)?);
            }
            Some(fields::PART_INDEX) => {
                let raw = read_text(field).await?;
                form.part_index = Some(parse_number(fields::PART_INDEX, &raw)?);
            }
            Some(fields::TOTAL_PARTS) => {
                let raw = read_text(field).await?;
                form.total_parts = Some(parse_number(fields::TOTAL_PARTS, &raw)?);
            }
            // Unknown fields are ignored; widgets send extras like qqpartbyteoffset.
            _ => {}
        }
    }

    Ok(())
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart field: {e}")))
}

/// Stream a file part to a fresh path in the engine's staging area.
async fn stage_field(
    state: &AppState,
    field: &mut axum::extract::multipart::Field<'_>,
) -> ApiResult<PathBuf> {
    let path = state.engine.new_staging_path();
    let mut file = fs::File::create(&path)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to create staging file: {e}")))?;

    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&path).await;
                return Err(ApiError::BadRequest(format!("truncated upload body: {e}")));
            }
        };
        if let Err(e) = file.write_all(&chunk).await {
            drop(file);
            let _ = fs::remove_file(&path).await;
            return Err(ApiError::Internal(format!(
                "failed to write staging file: {e}"
            )));
        }
    }

    file.flush()
        .await
        .map_err(|e| ApiError::Internal(format!("failed to flush staging file: {e}")))?;
    Ok(path)
}

/// POST /uploads - receive one chunk or one whole file.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let form = read_form(&state, &mut multipart).await?;

    let result = handle_upload(&state, &form).await;
    if result.is_err() {
        // The staged payload is orphaned if the engine did not consume it.
        if let Some(staged) = &form.staged {
            let _ = fs::remove_file(staged).await;
        }
    }
    result?;

    Ok(Json(json!({ "success": true })))
}

async fn handle_upload(state: &AppState, form: &UploadForm) -> ApiResult<()> {
    let uuid = form.uuid()?;
    let name = form.file_name()?;
    let staged = form.staged()?;

    match form.part_index {
        Some(index) => {
            let total_parts = form.total_parts.ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "{} requires {}",
                    fields::PART_INDEX,
                    fields::TOTAL_PARTS
                ))
            })?;
            let chunk = ChunkUpload::new(uuid, index, total_parts, form.total_size, name)?;

            let outcome = state.engine.handle_chunk(&chunk, staged).await.map_err(|e| {
                metrics::record_upload_error("store_chunk");
                e
            })?;
            metrics::CHUNKS_STORED.inc();

            if let ChunkOutcome::Assembled(path) = outcome {
                metrics::UPLOADS_ASSEMBLED.inc();
                tracing::info!(uuid = %uuid, path = %path.display(), "upload assembled");
            }
        }
        None => {
            let file = FileUpload::new(uuid, name)?;
            state.engine.handle_file(&file, staged).await.map_err(|e| {
                metrics::record_upload_error("store_file");
                e
            })?;
            metrics::FILES_STORED.inc();
        }
    }

    Ok(())
}

/// Form body of the upload-complete callback.
#[derive(Debug, Deserialize)]
pub struct FinalizeForm {
    #[serde(rename = "qqfilename")]
    pub file_name: String,
    #[serde(rename = "qqtotalparts")]
    pub total_parts: u32,
    #[serde(rename = "qqtotalfilesize")]
    pub total_size: u64,
}

/// POST /uploads/{uuid}/done - success callback after the last chunk.
///
/// Assembles any staged chunks that a failed chunk request left behind, then
/// verifies the assembled file against the declared size.
#[tracing::instrument(skip(state, form), fields(uuid = %uuid))]
pub async fn finalize_upload(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Form(form): Form<FinalizeForm>,
) -> ApiResult<Json<Value>> {
    let uuid = UploadId::parse(&uuid)?;

    let timer = metrics::ASSEMBLE_DURATION.start_timer();
    let result = state
        .engine
        .finalize(&uuid, &form.file_name, form.total_parts, form.total_size)
        .await;
    timer.observe_duration();

    result.map_err(|e| {
        metrics::record_upload_error("finalize");
        e
    })?;
    Ok(Json(json!({ "success": true })))
}

/// DELETE /uploads/{uuid} - remove an assembled upload.
///
/// Idempotent: deleting an upload that never existed still succeeds.
#[tracing::instrument(skip(state), fields(uuid = %uuid))]
pub async fn delete_upload(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> ApiResult<Json<Value>> {
    let uuid = UploadId::parse(&uuid)?;
    state.engine.delete_upload(&uuid).await.map_err(|e| {
        metrics::record_upload_error("delete");
        e
    })?;
    metrics::UPLOADS_DELETED.inc();
    Ok(Json(json!({ "success": true })))
}
