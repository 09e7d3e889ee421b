//! Owner-scoped reads and deletes. Every lookup of a file that does not
//! exist, or belongs to someone else, is the same `NotFound`.

use std::path::PathBuf;
use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::db::stats_repo::OwnerStats;
use crate::error::{ServiceError, ValidationError};
use crate::files::{FileMetadata, FileRecord, FileStatus, FileType};
use crate::pipeline::ArtifactGuard;
use crate::store::{FilePage, FileStore, ListQuery, MAX_LIST_LIMIT};

pub const STILL_PROCESSING_MESSAGE: &str = "File is still being processed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressView {
    pub file_id: String,
    pub status: FileStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Parsed content, or the reason it is not available yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentView {
    pub file_id: String,
    pub filename: String,
    pub file_type: FileType,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FileMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<FileRecord> for ContentView {
    fn from(record: FileRecord) -> Self {
        let ready = record.status == FileStatus::Ready;
        Self {
            file_id: record.id,
            filename: record.original_filename,
            file_type: record.file_type,
            status: record.status,
            content: if ready { record.content } else { None },
            metadata: if ready { record.metadata } else { None },
            processing_time: if ready { record.processing_time } else { None },
            message: (!ready).then(|| STILL_PROCESSING_MESSAGE.to_string()),
            error_message: record.error_message,
        }
    }
}

pub struct FileQueries {
    store: Arc<dyn FileStore>,
    upload_dir: PathBuf,
}

impl FileQueries {
    pub fn new(store: Arc<dyn FileStore>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn get(&self, file_id: &str, owner_id: i64) -> Result<FileRecord, ServiceError> {
        self.store
            .get_by_owner(file_id, owner_id)?
            .ok_or_else(|| ServiceError::not_found(file_id))
    }

    pub fn progress(&self, file_id: &str, owner_id: i64) -> Result<ProgressView, ServiceError> {
        let record = self.get(file_id, owner_id)?;
        Ok(ProgressView {
            file_id: record.id,
            status: record.status,
            progress: record.progress,
            error_message: record.error_message,
        })
    }

    pub fn content(&self, file_id: &str, owner_id: i64) -> Result<ContentView, ServiceError> {
        self.get(file_id, owner_id).map(ContentView::from)
    }

    pub fn list(&self, query: &ListQuery) -> Result<FilePage, ServiceError> {
        if query.limit == 0 || query.limit > MAX_LIST_LIMIT {
            return Err(ValidationError::InvalidLimit {
                limit: query.limit,
                max: MAX_LIST_LIMIT,
            }
            .into());
        }
        Ok(self.store.list(query)?)
    }

    pub fn search(&self, owner_id: i64, term: &str) -> Result<Vec<FileRecord>, ServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ValidationError::EmptySearchTerm.into());
        }
        Ok(self.store.search(owner_id, term)?)
    }

    pub fn stats(&self, owner_id: i64) -> Result<OwnerStats, ServiceError> {
        Ok(self.store.stats(owner_id)?)
    }

    /// Removes the record and any upload artifact still on disk.
    pub fn delete(&self, file_id: &str, owner_id: i64) -> Result<(), ServiceError> {
        let record = self.get(file_id, owner_id)?;

        if !self.store.delete(file_id, owner_id)? {
            return Err(ServiceError::not_found(file_id));
        }
        drop(ArtifactGuard::new(&self.upload_dir.join(&record.filename)));

        info!("Deleted file {} for owner {}", file_id, owner_id);
        Ok(())
    }
}
