use super::MemoryStore;
use crate::storage::{FileItem, FileRecord, RecordStore, StorageStats};
use axum::body::Bytes;
use chrono::{DateTime, Utc};

const DEMO_FILE_NAME: &str = "demo-file.txt";
const DEMO_MEDIA_TYPE: &str = "text/plain; charset=utf-8";

/// Store that keeps the record lifecycle of [`MemoryStore`] but never holds
/// uploaded bytes. Every record is replaced with a single generated text file
/// describing what was uploaded.
#[derive(Debug, Clone, Default)]
pub struct DemoStore {
    inner: MemoryStore,
}

impl DemoStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
        }
    }

    fn placeholder(record: &FileRecord) -> FileItem {
        let mut lines = vec![
            "This is a demo file.".to_string(),
            String::new(),
            format!("Download code: {}", record.code),
        ];
        lines.extend(record.items.iter().map(|item| {
            format!(
                "Uploaded: {} ({} bytes, {})",
                item.name, item.size, item.media_type
            )
        }));
        lines.push(format!("Upload time: {}", record.created_at.to_rfc3339()));
        lines.push(format!(
            "Expiry time: {}",
            record
                .expires_at
                .map_or_else(|| "never".to_string(), |at| at.to_rfc3339())
        ));
        lines.push(String::new());
        lines.push(
            "The server is running in demo mode, uploaded content is not retained.\n".to_string(),
        );
        let text = lines.join("\n");
        FileItem::new(DEMO_FILE_NAME, DEMO_MEDIA_TYPE, Bytes::from(text))
    }
}

impl RecordStore for DemoStore {
    fn insert(&self, mut record: FileRecord) -> bool {
        record.items = vec![Self::placeholder(&record)];
        self.inner.insert(record)
    }

    fn get(&self, code: &str) -> Option<FileRecord> {
        self.inner.get(code)
    }

    fn delete(&self, code: &str) -> bool {
        self.inner.delete(code)
    }

    fn delete_if_expired(&self, code: &str, now: DateTime<Utc>) -> bool {
        self.inner.delete_if_expired(code, now)
    }

    fn record_download(&self, code: &str) -> Option<FileRecord> {
        self.inner.record_download(code)
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        self.inner.sweep_expired(now)
    }

    fn stats(&self, now: DateTime<Utc>) -> StorageStats {
        self.inner.stats(now)
    }
}
