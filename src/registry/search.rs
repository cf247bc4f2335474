use crate::storage::models::{FileRecord, FileSearch};

/// Mime filter value that matches every type.
pub const ALL_MIME_TYPES: &str = "all";

impl FileSearch {
    /// True when `file` satisfies every filter that is set. Empty strings
    /// count as unset.
    pub fn matches(&self, file: &FileRecord) -> bool {
        if let Some(owner) = self.owner.as_deref().filter(|o| !o.is_empty()) {
            if file.owner != owner {
                return false;
            }
        }

        if let Some(query) = self
            .query
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty())
        {
            if !file.filename.to_lowercase().contains(&query) {
                return false;
            }
        }

        if let Some(mime) = self
            .mime_type
            .as_deref()
            .filter(|m| !m.is_empty() && *m != ALL_MIME_TYPES)
        {
            if file.mime_type != mime {
                return false;
            }
        }

        if self.size_min.is_some_and(|min| file.size_bytes < min) {
            return false;
        }
        if self.size_max.is_some_and(|max| file.size_bytes > max) {
            return false;
        }

        // Day bounds are inclusive: the whole of date_min and date_max count.
        let day = file.uploaded_at.date_naive();
        if self.date_min.is_some_and(|min| day < min) {
            return false;
        }
        if self.date_max.is_some_and(|max| day > max) {
            return false;
        }

        true
    }
}
