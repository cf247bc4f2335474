mod admin;
mod auth;
mod files;
mod site;

use crate::api::response::ApiError;
use crate::auth::AuthError;

pub use admin::{list_users, overview, remove_user, update_user_role};
pub use auth::{login, logout, register, session};
pub use files::{delete_file, download_file, list_files, public_files, toggle_share, upload_files};
pub use site::{contact, health};

/// Map an AuthError to an ApiError
fn auth_error(e: AuthError) -> ApiError {
    match e {
        AuthError::AccountNotFound => ApiError::unauthorized(e.to_string()),
        AuthError::UsernameTaken | AuthError::LoginInProgress => ApiError::conflict(e.to_string()),
        AuthError::Random => ApiError::internal(e.to_string()),
        _ => ApiError::bad_request(e.to_string()),
    }
}
