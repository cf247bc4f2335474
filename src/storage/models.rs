use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// MIME type recorded when an upload declares none.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Access level of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// A registered account as persisted. The password is only ever held as a
/// salted PBKDF2 digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub username: String,
    pub password_hash: String,
    pub salt: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub role: Role,
}

impl Account {
    /// The account without its credential material.
    pub fn sanitize(&self) -> SessionUser {
        SessionUser {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
        }
    }
}

/// The identity half of a session; the token is held separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub role: Role,
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginSuccess {
    #[serde(flatten)]
    pub user: SessionUser,
    pub token: String,
}

/// Metadata of an uploaded file. No content is ever stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub owner: String,
    pub filename: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    pub mime_type: String,
    #[serde(rename = "uploadDate")]
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub is_public: bool,
}

/// An incoming file handle: name, byte count and declared type only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFile {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type", default)]
    pub mime_type: String,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }
}

/// Search filter over the file registry. Every field is optional and the
/// provided ones are combined with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSearch {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    /// Exact match; `"all"` disables the filter.
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

/// Aggregate byte counts over a set of file records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub total_files: u64,
    pub total_original: u64,
    pub total_deduplicated: u64,
    pub total_savings: u64,
    pub savings_percent: u32,
}
