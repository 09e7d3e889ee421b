//! `FileStore` wrappers used to observe and disturb the pipeline.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use filepulse::db::stats_repo::OwnerStats;
use filepulse::store::{FilePage, ListQuery};
use filepulse::{FileMetadata, FileRecord, FileStatus, FileStore, NewFileRecord, StoreError};

/// A successful write, in the order the store saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    Create {
        file_id: String,
    },
    Progress {
        file_id: String,
        progress: u8,
        status: Option<FileStatus>,
    },
    Content {
        file_id: String,
        status: FileStatus,
    },
    Error {
        file_id: String,
        message: String,
    },
}

impl StoreWrite {
    pub fn file_id(&self) -> &str {
        match self {
            Self::Create { file_id }
            | Self::Progress { file_id, .. }
            | Self::Content { file_id, .. }
            | Self::Error { file_id, .. } => file_id,
        }
    }
}

/// Counts `create` calls and records every applied write.
pub struct RecordingStore<S> {
    inner: S,
    creates: AtomicUsize,
    writes: Mutex<Vec<StoreWrite>>,
}

impl<S: FileStore> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            creates: AtomicUsize::new(0),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Writes applied to `file_id`.
    pub fn writes_for(&self, file_id: &str) -> Vec<StoreWrite> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.file_id() == file_id)
            .cloned()
            .collect()
    }

    /// `(status, progress)` after each write to `file_id`.
    pub fn states_for(&self, file_id: &str) -> Vec<(FileStatus, u8)> {
        let mut states = Vec::new();
        let mut current = (FileStatus::Uploading, 0u8);
        for write in self.writes_for(file_id) {
            current = match write {
                StoreWrite::Create { .. } => (FileStatus::Uploading, 0),
                StoreWrite::Progress {
                    progress, status, ..
                } => (status.unwrap_or(current.0), progress),
                StoreWrite::Content { status, .. } => {
                    let progress = if status == FileStatus::Ready { 100 } else { current.1 };
                    (status, progress)
                }
                StoreWrite::Error { .. } => (FileStatus::Failed, current.1),
            };
            states.push(current);
        }
        states
    }

    fn record(&self, write: StoreWrite) {
        self.writes.lock().unwrap().push(write);
    }
}

impl<S: FileStore> FileStore for RecordingStore<S> {
    fn create(&self, new: NewFileRecord) -> Result<FileRecord, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let record = self.inner.create(new)?;
        self.record(StoreWrite::Create {
            file_id: record.id.clone(),
        });
        Ok(record)
    }

    fn get_by_owner(&self, id: &str, owner_id: i64) -> Result<Option<FileRecord>, StoreError> {
        self.inner.get_by_owner(id, owner_id)
    }

    fn update_progress(
        &self,
        id: &str,
        progress: u8,
        status: Option<FileStatus>,
        processing_time: Option<i64>,
    ) -> Result<bool, StoreError> {
        let applied = self
            .inner
            .update_progress(id, progress, status, processing_time)?;
        if applied {
            self.record(StoreWrite::Progress {
                file_id: id.to_string(),
                progress,
                status,
            });
        }
        Ok(applied)
    }

    fn update_content(
        &self,
        id: &str,
        content: &serde_json::Value,
        metadata: Option<&FileMetadata>,
        status: FileStatus,
        processing_time: i64,
    ) -> Result<bool, StoreError> {
        let applied = self
            .inner
            .update_content(id, content, metadata, status, processing_time)?;
        if applied {
            self.record(StoreWrite::Content {
                file_id: id.to_string(),
                status,
            });
        }
        Ok(applied)
    }

    fn update_error(&self, id: &str, message: &str) -> Result<bool, StoreError> {
        let applied = self.inner.update_error(id, message)?;
        if applied {
            self.record(StoreWrite::Error {
                file_id: id.to_string(),
                message: message.to_string(),
            });
        }
        Ok(applied)
    }

    fn list(&self, query: &ListQuery) -> Result<FilePage, StoreError> {
        self.inner.list(query)
    }

    fn search(&self, owner_id: i64, term: &str) -> Result<Vec<FileRecord>, StoreError> {
        self.inner.search(owner_id, term)
    }

    fn stats(&self, owner_id: i64) -> Result<OwnerStats, StoreError> {
        self.inner.stats(owner_id)
    }

    fn delete(&self, id: &str, owner_id: i64) -> Result<bool, StoreError> {
        self.inner.delete(id, owner_id)
    }
}

/// Fails every `update_content` call, as a broken database would.
pub struct FailingStore<S> {
    inner: S,
}

impl<S: FileStore> FailingStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: FileStore> FileStore for FailingStore<S> {
    fn create(&self, new: NewFileRecord) -> Result<FileRecord, StoreError> {
        self.inner.create(new)
    }

    fn get_by_owner(&self, id: &str, owner_id: i64) -> Result<Option<FileRecord>, StoreError> {
        self.inner.get_by_owner(id, owner_id)
    }

    fn update_progress(
        &self,
        id: &str,
        progress: u8,
        status: Option<FileStatus>,
        processing_time: Option<i64>,
    ) -> Result<bool, StoreError> {
        self.inner
            .update_progress(id, progress, status, processing_time)
    }

    fn update_content(
        &self,
        id: &str,
        _content: &serde_json::Value,
        _metadata: Option<&FileMetadata>,
        _status: FileStatus,
        _processing_time: i64,
    ) -> Result<bool, StoreError> {
        Err(StoreError::InvalidRow {
            id: id.to_string(),
            reason: "disk full".to_string(),
        })
    }

    fn update_error(&self, id: &str, message: &str) -> Result<bool, StoreError> {
        self.inner.update_error(id, message)
    }

    fn list(&self, query: &ListQuery) -> Result<FilePage, StoreError> {
        self.inner.list(query)
    }

    fn search(&self, owner_id: i64, term: &str) -> Result<Vec<FileRecord>, StoreError> {
        self.inner.search(owner_id, term)
    }

    fn stats(&self, owner_id: i64) -> Result<OwnerStats, StoreError> {
        self.inner.stats(owner_id)
    }

    fn delete(&self, id: &str, owner_id: i64) -> Result<bool, StoreError> {
        self.inner.delete(id, owner_id)
    }
}
