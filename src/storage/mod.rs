mod app_storage;
mod backends;
mod record;

pub use app_storage::AppStorage;
pub use record::{FileItem, FileItemMetadata, FileRecord};

use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::Serialize;

/// Aggregate numbers over every record currently held by a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    #[serde(rename = "totalFiles")]
    pub total_records: usize,
    /// Includes records that have expired but were not swept yet.
    #[serde(rename = "totalSize")]
    pub total_bytes: u64,
    #[serde(rename = "activeFiles")]
    pub active_records: usize,
}

/// Keyed container of [`FileRecord`]s.
///
/// Every method is atomic with respect to the others for a given code.
/// Stores never interpret expiry on their own except where a `now` is passed in.
pub trait RecordStore {
    /// Insert a record under its code. Returns `false` without touching the
    /// existing entry if the code is already taken.
    fn insert(&self, record: FileRecord) -> bool;
    fn get(&self, code: &str) -> Option<FileRecord>;
    /// Returns `true` only for the call that actually removed the record.
    fn delete(&self, code: &str) -> bool;
    fn delete_if_expired(&self, code: &str, now: DateTime<Utc>) -> bool;
    /// Increment the download counter and return the updated record.
    fn record_download(&self, code: &str) -> Option<FileRecord>;
    fn sweep_expired(&self, now: DateTime<Utc>) -> usize;
    fn stats(&self, now: DateTime<Utc>) -> StorageStats;
}

#[derive(Debug, Clone)]
pub enum StorageProvider {
    #[cfg(feature = "storage-memory")]
    Memory(backends::MemoryStore),
    #[cfg(feature = "storage-demo")]
    Demo(backends::DemoStore),
}

impl RecordStore for StorageProvider {
    fn insert(&self, record: FileRecord) -> bool {
        match self {
            #[cfg(feature = "storage-memory")]
            StorageProvider::Memory(store) => store.insert(record),
            #[cfg(feature = "storage-demo")]
            StorageProvider::Demo(store) => store.insert(record),
        }
    }

    fn get(&self, code: &str) -> Option<FileRecord> {
        match self {
            #[cfg(feature = "storage-memory")]
            StorageProvider::Memory(store) => store.get(code),
            #[cfg(feature = "storage-demo")]
            StorageProvider::Demo(store) => store.get(code),
        }
    }

    fn delete(&self, code: &str) -> bool {
        match self {
            #[cfg(feature = "storage-memory")]
            StorageProvider::Memory(store) => store.delete(code),
            #[cfg(feature = "storage-demo")]
            StorageProvider::Demo(store) => store.delete(code),
        }
    }

    fn delete_if_expired(&self, code: &str, now: DateTime<Utc>) -> bool {
        match self {
            #[cfg(feature = "storage-memory")]
            StorageProvider::Memory(store) => store.delete_if_expired(code, now),
            #[cfg(feature = "storage-demo")]
            StorageProvider::Demo(store) => store.delete_if_expired(code, now),
        }
    }

    fn record_download(&self, code: &str) -> Option<FileRecord> {
        match self {
            #[cfg(feature = "storage-memory")]
            StorageProvider::Memory(store) => store.record_download(code),
            #[cfg(feature = "storage-demo")]
            StorageProvider::Demo(store) => store.record_download(code),
        }
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        match self {
            #[cfg(feature = "storage-memory")]
            StorageProvider::Memory(store) => store.sweep_expired(now),
            #[cfg(feature = "storage-demo")]
            StorageProvider::Demo(store) => store.sweep_expired(now),
        }
    }

    fn stats(&self, now: DateTime<Utc>) -> StorageStats {
        match self {
            #[cfg(feature = "storage-memory")]
            StorageProvider::Memory(store) => store.stats(now),
            #[cfg(feature = "storage-demo")]
            StorageProvider::Demo(store) => store.stats(now),
        }
    }
}

impl FromStr for StorageProvider {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            #[cfg(feature = "storage-memory")]
            "memory://" => Ok(Self::Memory(backends::MemoryStore::new())),

            #[cfg(feature = "storage-demo")]
            "demo://" => Ok(Self::Demo(backends::DemoStore::new())),

            _ => {
                let mut valid_sources = Vec::new();
                #[cfg(feature = "storage-memory")]
                valid_sources.push("'memory://'");
                #[cfg(feature = "storage-demo")]
                valid_sources.push("'demo://'");

                if valid_sources.is_empty() {
                    Err("No storage backends are enabled".to_string())
                } else {
                    Err(format!("Valid sources are: {}", valid_sources.join(", ")))
                }
            }
        }
    }
}
