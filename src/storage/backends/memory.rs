use crate::storage::{FileRecord, RecordStore, StorageStats};
use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    memory: DashMap<String, FileRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            memory: DashMap::new(),
        }
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, record: FileRecord) -> bool {
        match self.memory.entry(record.code.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(record);
                true
            }
        }
    }

    fn get(&self, code: &str) -> Option<FileRecord> {
        self.memory.get(code).map(|entry| entry.value().clone())
    }

    fn delete(&self, code: &str) -> bool {
        self.memory.remove(code).is_some()
    }

    fn delete_if_expired(&self, code: &str, now: DateTime<Utc>) -> bool {
        self.memory
            .remove_if(code, |_, record| record.is_expired_at(now))
            .is_some()
    }

    fn record_download(&self, code: &str) -> Option<FileRecord> {
        let mut entry = self.memory.get_mut(code)?;
        let record = entry.value_mut();
        record.download_count = record.download_count.saturating_add(1);
        Some(record.clone())
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.memory.retain(|code, record| {
            if record.is_expired_at(now) {
                debug!("Sweeping expired record {code}");
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    fn stats(&self, now: DateTime<Utc>) -> StorageStats {
        self.memory
            .iter()
            .fold(StorageStats::default(), |mut stats, entry| {
                let record = entry.value();
                stats.total_records += 1;
                stats.total_bytes += record.total_size();
                if !record.is_expired_at(now) {
                    stats.active_records += 1;
                }
                stats
            })
    }
}
