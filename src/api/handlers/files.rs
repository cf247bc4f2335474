use axum::extract::{Multipart, Path, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::extract::{CurrentUser, MaybeUser};
use crate::api::response::{ApiError, AppQuery, JSend, Pagination};
use crate::auth::access::LOGIN_PATH;
use crate::registry::stats;
use crate::storage::models::{FileRecord, FileSearch, SessionUser, StorageStats, UploadFile};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub download_count: u64,
    pub filename: String,
    pub id: String,
    pub is_public: bool,
    pub mime_type: String,
    pub owner: String,
    pub size_bytes: u64,
    pub uploaded_at: String,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub items: Vec<FileResponse>,
    pub pagination: Pagination,
    /// Computed over every match, not just the returned page
    pub stats: StorageStats,
}

#[derive(Debug, Deserialize)]
pub struct ListFilesParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size_min: Option<u64>,
    #[serde(default)]
    pub size_max: Option<u64>,
    #[serde(default)]
    pub date_min: Option<NaiveDate>,
    #[serde(default)]
    pub date_max: Option<NaiveDate>,
}

fn default_limit() -> u32 {
    50
}

// ============================================================================
// Handlers
// ============================================================================

/// Search the caller's own files.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppQuery(params): AppQuery<ListFilesParams>,
) -> Result<Json<JSend<FileListResponse>>, ApiError> {
    if params.limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than 0"));
    }

    let filter = FileSearch {
        owner: Some(user.username),
        query: params.query,
        mime_type: params.mime_type,
        size_min: params.size_min,
        size_max: params.size_max,
        date_min: params.date_min,
        date_max: params.date_max,
    };
    let matches = state.files.search(&filter);
    let stats = stats::compute(&matches);

    let items = matches
        .iter()
        .skip(params.offset as usize)
        .take(params.limit as usize)
        .map(file_to_response)
        .collect();

    Ok(JSend::success(FileListResponse {
        items,
        pagination: Pagination {
            limit: params.limit,
            offset: params.offset,
            total: matches.len() as u64,
        },
        stats,
    }))
}

/// Register every `file` part of a multipart body. Only the part's name,
/// declared content type and byte count are kept; the bytes are discarded.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<JSend<Vec<FileResponse>>>, ApiError> {
    let mut inputs = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field.content_type().unwrap_or_default().to_string();

        let mut size: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?
        {
            size += chunk.len() as u64;
            if size > state.config.max_upload_size {
                return Err(ApiError::payload_too_large(format!(
                    "File exceeds maximum upload size of {} bytes",
                    state.config.max_upload_size
                )));
            }
        }

        if name.trim().is_empty() {
            return Err(ApiError::bad_request("file parts must carry a filename"));
        }
        inputs.push(UploadFile::new(name, size, mime_type));
    }

    if inputs.is_empty() {
        return Err(ApiError::bad_request("at least one file field is required"));
    }

    let created = state.files.upload(&user.username, &inputs);
    Ok(JSend::success(created.iter().map(file_to_response).collect()))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    let file = owned_file(&state, &user, &id)?;

    if !state.files.delete(&file.id) {
        return Err(ApiError::not_found("File not found"));
    }
    Ok(JSend::success(()))
}

pub async fn toggle_share(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let file = owned_file(&state, &user, &id)?;

    let updated = state
        .files
        .toggle_share(&file.id)
        .ok_or_else(|| ApiError::not_found("File not found"))?;
    Ok(JSend::success(file_to_response(&updated)))
}

/// Count a download. Public files are open to anyone; private ones only
/// to their owner and administrators.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let file = state
        .files
        .get(&id)
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    if !file.is_public {
        match user {
            None => {
                return Err(ApiError::access_denied(
                    LOGIN_PATH,
                    format!("/files/{id}/download"),
                ))
            }
            Some(ref u) if !can_manage(u, &file) => {
                return Err(ApiError::forbidden("You do not have access to this file"))
            }
            Some(_) => {}
        }
    }

    let updated = state
        .files
        .increment_download(&id)
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    tracing::debug!(file_id = %id, downloads = updated.download_count, "Counted download");
    Ok(JSend::success(file_to_response(&updated)))
}

pub async fn public_files(State(state): State<Arc<AppState>>) -> Json<JSend<Vec<FileResponse>>> {
    JSend::success(
        state
            .files
            .public_files()
            .iter()
            .map(file_to_response)
            .collect(),
    )
}

// ============================================================================
// Helpers
// ============================================================================

/// Members manage their own files; administrators manage everything.
fn can_manage(user: &SessionUser, file: &FileRecord) -> bool {
    user.role.is_admin() || file.owner == user.username
}

fn owned_file(state: &AppState, user: &SessionUser, id: &str) -> Result<FileRecord, ApiError> {
    let file = state
        .files
        .get(id)
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    if !can_manage(user, &file) {
        return Err(ApiError::forbidden("You do not have access to this file"));
    }
    Ok(file)
}

pub(crate) fn file_to_response(file: &FileRecord) -> FileResponse {
    FileResponse {
        download_count: file.download_count,
        filename: file.filename.clone(),
        id: file.id.clone(),
        is_public: file.is_public,
        mime_type: file.mime_type.clone(),
        owner: file.owner.clone(),
        size_bytes: file.size_bytes,
        uploaded_at: file.uploaded_at.to_rfc3339(),
    }
}
