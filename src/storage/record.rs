use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single uploaded file belonging to a [`FileRecord`].
#[derive(Debug, Clone)]
pub struct FileItem {
    pub name: String,
    pub size: u64,
    pub media_type: String,
    /// Uploaded bytes. Cloning an item only bumps a reference count.
    pub content: Bytes,
}

impl FileItem {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, content: Bytes) -> Self {
        Self {
            name: name.into(),
            size: content.len() as u64,
            media_type: media_type.into(),
            content,
        }
    }

    pub fn metadata(&self) -> FileItemMetadata {
        FileItemMetadata {
            original_name: self.name.clone(),
            size: self.size,
            mimetype: self.media_type.clone(),
        }
    }
}

/// Publicly visible description of a [`FileItem`], without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItemMetadata {
    pub original_name: String,
    pub size: u64,
    pub mimetype: String,
}

/// Everything stored for one upload, keyed by its download code.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub code: String,
    pub items: Vec<FileItem>,
    pub password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub download_count: u64,
}

impl FileRecord {
    /// Whether this record is logically gone at `now`.
    ///
    /// Lazy expiry on lookup, the background sweep and statistics all go
    /// through this one predicate.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    pub fn total_size(&self) -> u64 {
        self.items.iter().map(|item| item.size).sum()
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}
