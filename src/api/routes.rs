use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize;

    Router::new()
        // Session
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/register", post(handlers::register))
        .route("/auth/session", get(handlers::session))
        // Files
        .route("/files", get(handlers::list_files))
        .route(
            "/files",
            post(handlers::upload_files).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/files/:id", delete(handlers::delete_file))
        .route("/files/:id/download", post(handlers::download_file))
        .route("/files/:id/share", put(handlers::toggle_share))
        .route("/public/files", get(handlers::public_files))
        // Administration
        .route("/admin/overview", get(handlers::overview))
        .route("/admin/users", get(handlers::list_users))
        .route("/admin/users/:username", delete(handlers::remove_user))
        .route("/admin/users/:username/role", put(handlers::update_user_role))
        // Site
        .route("/contact", post(handlers::contact))
        // Internal
        .route("/_internal/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
