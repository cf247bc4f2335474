//! The file registry: metadata-only records of uploaded files, written
//! through to the key-value backend on every mutation.

mod search;
pub mod stats;

pub use search::ALL_MIME_TYPES;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::storage::models::{FileRecord, FileSearch, StorageStats, UploadFile, DEFAULT_MIME_TYPE};
use crate::storage::{write_json, KeyValueStore, FILES_KEY};

pub struct FileRegistry {
    kv: Arc<dyn KeyValueStore>,
    records: Mutex<Vec<FileRecord>>,
}

impl FileRegistry {
    pub fn open(kv: Arc<dyn KeyValueStore>) -> Self {
        let registry = Self {
            kv,
            records: Mutex::new(Vec::new()),
        };
        registry.reload();
        registry
    }

    /// Replace the in-memory records with whatever the backend holds.
    pub fn reload(&self) {
        let records = load_records(self.kv.as_ref());
        *self.lock() = records;
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FileRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, records: &[FileRecord]) {
        write_json(self.kv.as_ref(), FILES_KEY, records);
    }

    /// Apply `f` to the record with `id` and persist. Returns the updated
    /// record, or `None` when no record matches.
    fn update<F>(&self, id: &str, f: F) -> Option<FileRecord>
    where
        F: FnOnce(&mut FileRecord),
    {
        let mut records = self.lock();
        let record = records.iter_mut().find(|r| r.id == id)?;
        f(record);
        let updated = record.clone();
        self.persist(&records);
        Some(updated)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Register metadata for `inputs` under `owner`. Nothing happens when the
    /// owner is empty or there are no inputs.
    pub fn upload(&self, owner: &str, inputs: &[UploadFile]) -> Vec<FileRecord> {
        if owner.is_empty() || inputs.is_empty() {
            return Vec::new();
        }

        let now = Utc::now();
        let additions: Vec<FileRecord> = inputs
            .iter()
            .map(|input| FileRecord {
                id: uuid::Uuid::new_v4().to_string(),
                owner: owner.to_string(),
                filename: input.name.clone(),
                size_bytes: input.size,
                mime_type: if input.mime_type.is_empty() {
                    DEFAULT_MIME_TYPE.to_string()
                } else {
                    input.mime_type.clone()
                },
                uploaded_at: now,
                download_count: 0,
                is_public: false,
            })
            .collect();

        let mut records = self.lock();
        records.extend(additions.iter().cloned());
        self.persist(&records);

        tracing::debug!(owner, count = additions.len(), "Registered uploads");
        additions
    }

    /// Remove a record. Returns false when no record matches.
    pub fn delete(&self, id: &str) -> bool {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return false;
        }
        self.persist(&records);

        tracing::debug!(file_id = %id, "Deleted file");
        true
    }

    /// Flip public visibility
    pub fn toggle_share(&self, id: &str) -> Option<FileRecord> {
        let updated = self.update(id, |r| r.is_public = !r.is_public);
        if let Some(ref file) = updated {
            tracing::debug!(file_id = %id, is_public = file.is_public, "Toggled share");
        }
        updated
    }

    pub fn increment_download(&self, id: &str) -> Option<FileRecord> {
        self.update(id, |r| r.download_count = r.download_count.saturating_add(1))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get(&self, id: &str) -> Option<FileRecord> {
        self.lock().iter().find(|r| r.id == id).cloned()
    }

    /// All records in insertion order
    pub fn files(&self) -> Vec<FileRecord> {
        self.lock().clone()
    }

    pub fn public_files(&self) -> Vec<FileRecord> {
        self.lock().iter().filter(|r| r.is_public).cloned().collect()
    }

    /// Records matching every set filter, in insertion order
    pub fn search(&self, filter: &FileSearch) -> Vec<FileRecord> {
        self.lock()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    /// Statistics over the whole registry
    pub fn stats(&self) -> StorageStats {
        stats::compute(&self.lock())
    }
}

/// Decode the stored record list. Anything other than an array yields an
/// empty registry; array entries that are not valid records are skipped.
fn load_records(kv: &dyn KeyValueStore) -> Vec<FileRecord> {
    let Some(entries) = crate::storage::read_json::<serde_json::Value>(kv, FILES_KEY) else {
        return Vec::new();
    };

    let serde_json::Value::Array(entries) = entries else {
        tracing::warn!(key = FILES_KEY, "Stored files are not a list, starting empty");
        return Vec::new();
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<FileRecord>(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable file record");
                None
            }
        })
        .collect()
}
