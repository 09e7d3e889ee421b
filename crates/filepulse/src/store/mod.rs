//! File record store contract and its SQLite implementation.

mod sqlite;

pub use sqlite::SqliteFileStore;

use serde::Serialize;

use crate::db::stats_repo::OwnerStats;
use crate::error::StoreError;
use crate::files::{FileMetadata, FileRecord, FileStatus, FileType, NewFileRecord};

pub const DEFAULT_LIST_LIMIT: u64 = 50;
pub const MAX_LIST_LIMIT: u64 = 100;

/// Owner-scoped listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub owner_id: i64,
    pub file_type: Option<FileType>,
    pub status: Option<FileStatus>,
    pub limit: u64,
    pub offset: u64,
}

impl ListQuery {
    pub fn for_owner(owner_id: i64) -> Self {
        Self {
            owner_id,
            file_type: None,
            status: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

/// One page of an owner's files, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct FilePage {
    pub files: Vec<FileRecord>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Persistence for file records.
///
/// Update operations return `Ok(false)` when the record is absent or
/// already terminal; absence is never an error.
pub trait FileStore: Send + Sync {
    /// Persists a new record in `uploading` state.
    fn create(&self, new: NewFileRecord) -> Result<FileRecord, StoreError>;

    fn get_by_owner(&self, id: &str, owner_id: i64) -> Result<Option<FileRecord>, StoreError>;

    fn update_progress(
        &self,
        id: &str,
        progress: u8,
        status: Option<FileStatus>,
        processing_time: Option<i64>,
    ) -> Result<bool, StoreError>;

    /// Stores the parse result. A `ready` status also sets progress to 100.
    fn update_content(
        &self,
        id: &str,
        content: &serde_json::Value,
        metadata: Option<&FileMetadata>,
        status: FileStatus,
        processing_time: i64,
    ) -> Result<bool, StoreError>;

    /// Marks the record `failed` with `message`.
    fn update_error(&self, id: &str, message: &str) -> Result<bool, StoreError>;

    fn list(&self, query: &ListQuery) -> Result<FilePage, StoreError>;

    fn search(&self, owner_id: i64, term: &str) -> Result<Vec<FileRecord>, StoreError>;

    fn stats(&self, owner_id: i64) -> Result<OwnerStats, StoreError>;

    fn delete(&self, id: &str, owner_id: i64) -> Result<bool, StoreError>;
}
