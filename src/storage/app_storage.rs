use super::{FileItem, FileRecord, RecordStore, StorageProvider, StorageStats};
use crate::error::{AccessError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

/// Random bytes per download code, rendered as twice as many hex characters.
const CODE_BYTES: usize = 8;
const MAX_CODE_ATTEMPTS: usize = 8;

fn random_code() -> String {
    let bytes: [u8; CODE_BYTES] = rand::random();
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[derive(Debug)]
pub struct AppStorage {
    provider: StorageProvider,
    generate_code: fn() -> String,
}

impl AppStorage {
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            generate_code: random_code,
        }
    }

    #[cfg(test)]
    pub fn with_code_generator(provider: StorageProvider, generate_code: fn() -> String) -> Self {
        Self {
            provider,
            generate_code,
        }
    }

    /// Store a new record under a freshly generated code.
    ///
    /// A `ttl` of `None` or zero means the record never expires. Code collisions
    /// are retried with a new code and are never visible to the caller unless
    /// every attempt collides.
    pub fn create(
        &self,
        items: Vec<FileItem>,
        password: Option<String>,
        ttl: Option<TimeDelta>,
        now: DateTime<Utc>,
    ) -> Result<FileRecord> {
        if items.is_empty() {
            return Err(AccessError::InvalidInput(
                "at least one file must be uploaded".to_string(),
            ));
        }
        let expires_at = match ttl.filter(|ttl| !ttl.is_zero()) {
            Some(ttl) => Some(now.checked_add_signed(ttl).ok_or_else(|| {
                AccessError::InvalidInput("expiry is too far in the future".to_string())
            })?),
            None => None,
        };

        let mut record = FileRecord {
            code: String::new(),
            items,
            password,
            created_at: now,
            expires_at,
            download_count: 0,
        };
        for _ in 0..MAX_CODE_ATTEMPTS {
            record.code = (self.generate_code)();
            if self.provider.insert(record.clone()) {
                debug!(
                    "Stored record {} with {} item(s) in storage",
                    record.code,
                    record.items.len()
                );
                return Ok(record);
            }
            warn!("Download code {} already in use - regenerating", record.code);
        }
        Err(AccessError::InternalFailure(
            "could not allocate a unique download code".to_string(),
        ))
    }

    pub fn get(&self, code: &str) -> Option<FileRecord> {
        debug!("Fetching record {code} from storage");
        self.provider.get(code)
    }

    pub fn delete(&self, code: &str) -> bool {
        debug!("Deleting record {code} from storage");
        self.provider.delete(code)
    }

    pub fn delete_if_expired(&self, code: &str, now: DateTime<Utc>) -> bool {
        self.provider.delete_if_expired(code, now)
    }

    pub fn record_download(&self, code: &str) -> Option<FileRecord> {
        self.provider.record_download(code)
    }

    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        self.provider.sweep_expired(now)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> StorageStats {
        self.provider.stats(now)
    }
}
