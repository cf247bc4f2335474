use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiError, AppJson, JSend};
use crate::validation::{is_non_empty, is_valid_email};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Validate a contact inquiry. Inquiries are acknowledged, not stored.
pub async fn contact(
    AppJson(req): AppJson<ContactRequest>,
) -> Result<Json<JSend<ContactResponse>>, ApiError> {
    if !is_non_empty(&req.name) || !is_non_empty(&req.message) {
        return Err(ApiError::bad_request(
            "Please share your name and a short project note.",
        ));
    }
    if !is_valid_email(&req.email) {
        return Err(ApiError::bad_request(
            "Let us know how to reach you with a valid email.",
        ));
    }

    tracing::info!(email = %req.email.trim(), "Received contact inquiry");
    Ok(JSend::success(ContactResponse {
        message: "Thanks for reaching out! We will respond within two business days.".to_string(),
    }))
}
