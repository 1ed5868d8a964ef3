use crate::{
    clock::Clock,
    error::{AccessError, Result},
    storage::{AppStorage, FileItem, FileItemMetadata, FileRecord, StorageStats},
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// What a successful upload hands back to the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub code: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub file_count: usize,
    pub total_size: u64,
}

/// Public view of a record. The password itself never leaves the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInfo {
    pub files: Vec<FileItemMetadata>,
    pub has_password: bool,
    #[serde(rename = "uploadDate")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "expiryDate")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&FileRecord> for RecordInfo {
    fn from(record: &FileRecord) -> Self {
        Self {
            files: record.items.iter().map(FileItem::metadata).collect(),
            has_password: record.has_password(),
            created_at: record.created_at,
            expires_at: record.expires_at,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Download {
    /// The record holds exactly one file.
    File(FileItem),
    /// The record holds several files; only their metadata is returned.
    Listing(Vec<FileItemMetadata>),
}

/// Decides who may read what, on top of an [`AppStorage`].
#[derive(Debug, Clone)]
pub struct AccessController {
    storage: Arc<AppStorage>,
    clock: Arc<dyn Clock>,
    default_expiry_days: u32,
    max_files: usize,
}

impl AccessController {
    pub fn new(
        storage: Arc<AppStorage>,
        clock: Arc<dyn Clock>,
        default_expiry_days: u32,
        max_files: usize,
    ) -> Self {
        Self {
            storage,
            clock,
            default_expiry_days,
            max_files,
        }
    }

    /// Create a record for `items`.
    ///
    /// `expiry_days` falls back to the configured default when absent; `0`
    /// keeps the record until it is deleted.
    pub fn upload(
        &self,
        items: Vec<FileItem>,
        password: Option<String>,
        expiry_days: Option<u32>,
    ) -> Result<UploadReceipt> {
        if items.len() > self.max_files {
            return Err(AccessError::InvalidInput(format!(
                "at most {} files can be uploaded at once",
                self.max_files
            )));
        }
        let days = expiry_days.unwrap_or(self.default_expiry_days);
        let ttl = TimeDelta::try_days(i64::from(days))
            .ok_or_else(|| AccessError::InvalidInput("expiry is out of range".to_string()))?;
        let password = password.filter(|password| !password.is_empty());

        let record = self
            .storage
            .create(items, password, Some(ttl), self.clock.now())?;
        Ok(UploadReceipt {
            file_count: record.items.len(),
            total_size: record.total_size(),
            code: record.code,
            expires_at: record.expires_at,
        })
    }

    /// Largest number of files a single upload may carry.
    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn info(&self, code: &str) -> Result<RecordInfo> {
        let record = self.live_record(code, self.clock.now())?;
        Ok(RecordInfo::from(&record))
    }

    pub fn verify_password(&self, code: &str, password: Option<&str>) -> Result<()> {
        let record = self.live_record(code, self.clock.now())?;
        check_password(&record, password)
    }

    /// Retrieve the content of a record, counting the download.
    pub fn download(&self, code: &str, password: Option<&str>) -> Result<Download> {
        let record = self.live_record(code, self.clock.now())?;
        check_password(&record, password)?;

        // The record may have been deleted since it was read.
        let record = self
            .storage
            .record_download(&record.code)
            .ok_or(AccessError::NotFound)?;
        debug!(
            "Record {} downloaded ({} total)",
            record.code, record.download_count
        );
        Ok(match record.items.as_slice() {
            [item] => Download::File(item.clone()),
            items => Download::Listing(items.iter().map(FileItem::metadata).collect()),
        })
    }

    /// Remove a record. Deleting an unknown code is not an error.
    pub fn delete_record(&self, code: &str) -> Result<()> {
        let code = validate_code(code)?;
        if !self.storage.delete(code) {
            debug!("Record {code} was already absent");
        }
        Ok(())
    }

    pub fn stats(&self) -> StorageStats {
        self.storage.stats(self.clock.now())
    }

    /// Physically remove every expired record, returning how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.storage.sweep_expired(self.clock.now())
    }

    /// Look up a record that is still live at `now`, removing it if it expired.
    fn live_record(&self, code: &str, now: DateTime<Utc>) -> Result<FileRecord> {
        let code = validate_code(code)?;
        let record = self.storage.get(code).ok_or(AccessError::NotFound)?;
        if record.is_expired_at(now) {
            if self.storage.delete_if_expired(code, now) {
                debug!("Record {code} expired - removed on access");
            }
            return Err(AccessError::NotFound);
        }
        Ok(record)
    }
}

fn validate_code(code: &str) -> Result<&str> {
    if code.is_empty() {
        return Err(AccessError::InvalidInput(
            "download code is missing".to_string(),
        ));
    }
    Ok(code)
}

/// Plain, case-sensitive comparison against the stored secret.
fn check_password(record: &FileRecord, supplied: Option<&str>) -> Result<()> {
    let Some(expected) = record.password.as_deref() else {
        return Ok(());
    };
    match supplied.filter(|password| !password.is_empty()) {
        None => Err(AccessError::PasswordRequired),
        Some(password) if password == expected => Ok(()),
        Some(_) => Err(AccessError::InvalidPassword),
    }
}
