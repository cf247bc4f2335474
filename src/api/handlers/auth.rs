use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth_error;
use crate::api::extract::MaybeUser;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::auth::access;
use crate::storage::models::{LoginSuccess, SessionUser};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Path the caller was sent away from, if any
    #[serde(default)]
    pub from: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub session: LoginSuccess,
    pub redirect_to: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(alias = "confirmPassword")]
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Option<SessionUser>,
    pub is_authenticated: bool,
    pub is_authenticating: bool,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<JSend<LoginResponse>>, ApiError> {
    let session = state
        .sessions
        .login(&req.username, &req.password)
        .await
        .map_err(auth_error)?;

    let redirect_to = access::post_login_redirect(req.from.as_deref(), session.user.role);
    Ok(JSend::success(LoginResponse {
        session,
        redirect_to,
    }))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<Json<JSend<SessionUser>>, ApiError> {
    let user = state
        .sessions
        .register(&req.username, &req.password, &req.confirm_password)
        .map_err(auth_error)?;

    Ok(JSend::success(user))
}

/// End the active session. Only its token holder may do so; with no active
/// session this succeeds without doing anything.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
) -> Result<Json<JSend<()>>, ApiError> {
    match user {
        Some(user) => {
            state.sessions.logout();
            tracing::info!(username = %user.username, "Signed out");
        }
        None if state.sessions.is_authenticated() => {
            return Err(ApiError::unauthorized("Sign in to end this session"));
        }
        None => {}
    }
    Ok(JSend::success(()))
}

pub async fn session(State(state): State<Arc<AppState>>) -> Json<JSend<SessionResponse>> {
    let is_authenticated = state.sessions.is_authenticated();
    JSend::success(SessionResponse {
        user: state.sessions.current_user().filter(|_| is_authenticated),
        is_authenticated,
        is_authenticating: state.sessions.is_authenticating(),
    })
}
