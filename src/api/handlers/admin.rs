use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::files::{file_to_response, FileResponse};
use crate::api::extract::AdminUser;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::auth::is_protected;
use crate::registry::stats;
use crate::storage::models::{Role, SessionUser, StorageStats};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub downloads: u64,
    pub file_count: u64,
    pub files: Vec<FileResponse>,
    pub public_file_count: u64,
    pub stats: StorageStats,
    pub user_count: u64,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Json<JSend<Vec<SessionUser>>> {
    JSend::success(state.sessions.users())
}

pub async fn update_user_role(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(username): Path<String>,
    AppJson(req): AppJson<UpdateRoleRequest>,
) -> Result<Json<JSend<SessionUser>>, ApiError> {
    if !state.sessions.update_user_role(&username, req.role) {
        return Err(ApiError::not_found("User not found"));
    }

    let user = state
        .sessions
        .users()
        .into_iter()
        .find(|u| u.username.eq_ignore_ascii_case(username.trim()))
        .ok_or_else(|| ApiError::internal("User not found after update"))?;

    tracing::info!(by = %admin.username, username = %user.username, role = ?user.role, "Changed role");
    Ok(JSend::success(user))
}

pub async fn remove_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(username): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    if is_protected(&username) {
        return Err(ApiError::conflict(format!(
            "'{}' is a protected account and cannot be removed",
            username.trim()
        )));
    }
    if !state.sessions.remove_user(&username) {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(by = %admin.username, username = %username, "Removed user");
    Ok(JSend::success(()))
}

/// Workspace-wide totals plus every stored file.
pub async fn overview(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Json<JSend<OverviewResponse>> {
    let files = state.files.files();
    let downloads = stats::saturating_total(files.iter().map(|f| f.download_count));
    let public_file_count = files.iter().filter(|f| f.is_public).count() as u64;

    JSend::success(OverviewResponse {
        downloads,
        file_count: files.len() as u64,
        public_file_count,
        stats: state.files.stats(),
        user_count: state.sessions.users().len() as u64,
        files: files.iter().map(file_to_response).collect(),
    })
}
