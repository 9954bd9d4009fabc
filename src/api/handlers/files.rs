use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, AppQuery, Paginated, Pagination};
use crate::storage::models::{FileRecord, ProcessingResult, ProcessingStatus};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UploadFileRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct UploadFileResponse {
    pub id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: String,
    pub name: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct FileSummaryResponse {
    pub id: String,
    pub name: String,
    pub storage_key: String,
    pub byte_size: u64,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ResultRecordResponse {
    pub id: String,
    pub file_id: String,
    pub status: ProcessingStatus,
    pub result: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct PendingResultResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResultResponse {
    Pending(PendingResultResponse),
    Record(ResultRecordResponse),
}

#[derive(Debug, Deserialize)]
pub struct ListFilesParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    20
}

// ============================================================================
// Handlers
// ============================================================================

/// Upload a file. Left unauthenticated, unlike the read endpoints.
///
/// The metadata row is upserted before the content is written. Re-uploading an
/// existing id drops the old processing result, so the new content reads as
/// processing until the worker sees it. If the content write fails the metadata
/// write is rolled back, so a failed upload leaves no row pointing at a missing
/// object and a retry with the same id is safe.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<UploadFileRequest>,
) -> Result<(StatusCode, Json<UploadFileResponse>), ApiError> {
    let id = req
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    validate_id(&id)?;
    validate_name(&req.name)?;

    if req.content.len() as u64 > state.config.max_upload_size {
        return Err(ApiError::payload_too_large(format!(
            "File exceeds maximum upload size of {} bytes",
            state.config.max_upload_size
        )));
    }

    let record = FileRecord::new(id, req.name, req.content.len() as u64);

    tracing::debug!(file_id = %record.id, storage_key = %record.storage_key, "Saving file metadata");
    let replaced = state.db.put_file(&record)?;

    if let Err(e) = state
        .object_store
        .put(&record.storage_key, Bytes::from(req.content))
        .await
    {
        tracing::error!(
            file_id = %record.id,
            storage_key = %record.storage_key,
            error = %e,
            "Failed to store file content"
        );

        let rollback = match replaced {
            Some(replaced) => state.db.restore_file(&replaced),
            None => state.db.delete_file(&record.id).map(|_| ()),
        };
        if let Err(e) = rollback {
            tracing::error!(file_id = %record.id, error = %e, "Failed to roll back file metadata");
        }

        return Err(ApiError::internal("Error uploading file"));
    }

    tracing::info!(file_id = %record.id, storage_key = %record.storage_key, "Uploaded file");

    Ok((
        StatusCode::CREATED,
        Json(UploadFileResponse {
            id: record.id,
            status: "uploaded".to_string(),
            message: "File uploaded successfully and processing started".to_string(),
        }),
    ))
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    let file = state
        .db
        .get_file(&id)?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    // A missing object here means metadata exists without content.
    let data = state.object_store.get(&file.storage_key).await.map_err(|e| {
        tracing::error!(file_id = %file.id, storage_key = %file.storage_key, error = %e, "Failed to retrieve file content");
        ApiError::internal("Error retrieving file content")
    })?;

    Ok(Json(FileResponse {
        id: file.id,
        name: file.name,
        content: String::from_utf8_lossy(&data).into_owned(),
        created_at: file.created_at.to_rfc3339(),
    }))
}

pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ResultResponse>, ApiError> {
    match state.db.get_result(&id)? {
        Some(result) => Ok(Json(ResultResponse::Record(result_to_response(result)))),
        None => {
            if !state.db.file_exists(&id)? {
                return Err(ApiError::not_found("File not found"));
            }
            Ok(Json(ResultResponse::Pending(PendingResultResponse {
                status: "processing".to_string(),
                message: "Processing not complete or not started".to_string(),
            })))
        }
    }
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListFilesParams>,
) -> Result<Json<Paginated<FileSummaryResponse>>, ApiError> {
    if params.limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than 0"));
    }

    let files = state.db.list_files()?;
    let total = files.len() as u64;
    let items: Vec<FileSummaryResponse> = files
        .into_iter()
        .skip(params.offset as usize)
        .take(params.limit as usize)
        .map(file_to_summary)
        .collect();

    Ok(Json(Paginated {
        items,
        pagination: Pagination {
            limit: params.limit,
            offset: params.offset,
            total,
        },
    }))
}

// ============================================================================
// Helpers
// ============================================================================

/// The id becomes the second segment of the storage key, which the worker parses back out.
fn validate_id(id: &str) -> Result<(), ApiError> {
    if id.contains('/') || id.contains('\\') || id == "." || id == ".." {
        return Err(ApiError::bad_request(
            "id must not contain path separators or be a relative path segment",
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    if name
        .split(['/', '\\'])
        .any(|segment| segment == "." || segment == "..")
    {
        return Err(ApiError::bad_request(
            "name must not contain relative path segments",
        ));
    }
    Ok(())
}

fn file_to_summary(file: FileRecord) -> FileSummaryResponse {
    FileSummaryResponse {
        created_at: file.created_at.to_rfc3339(),
        id: file.id,
        name: file.name,
        storage_key: file.storage_key,
        byte_size: file.byte_size,
    }
}

fn result_to_response(result: ProcessingResult) -> ResultRecordResponse {
    ResultRecordResponse {
        created_at: result.created_at.to_rfc3339(),
        id: result.id,
        file_id: result.file_id,
        status: result.status,
        result: result.result,
    }
}
