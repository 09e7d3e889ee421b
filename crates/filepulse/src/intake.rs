//! Upload intake: validate, persist the artifact, create the record and
//! hand the file to the worker pool. Never waits for processing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ServiceError, ValidationError};
use crate::files::{FileStatus, FileType, NewFileRecord};
use crate::pipeline::ArtifactGuard;
use crate::sanitize;
use crate::store::FileStore;
use crate::worker::{ProcessingJob, WorkerPool};

pub const UPLOAD_ACCEPTED_MESSAGE: &str = "File uploaded successfully and processing started";

/// Returned as soon as the file is queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub file_id: String,
    pub filename: String,
    pub file_type: FileType,
    pub status: FileStatus,
    pub message: String,
}

pub struct UploadIntake {
    upload_dir: PathBuf,
    max_upload_bytes: u64,
    store: Arc<dyn FileStore>,
    pool: Arc<WorkerPool>,
}

impl UploadIntake {
    pub fn new(
        upload_dir: impl Into<PathBuf>,
        max_upload_bytes: u64,
        store: Arc<dyn FileStore>,
        pool: Arc<WorkerPool>,
    ) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_upload_bytes,
            store,
            pool,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Checks name, type and size. Nothing is written when this fails.
    pub fn validate(&self, filename: &str, bytes: &[u8]) -> Result<FileType, ValidationError> {
        let file_type = FileType::from_filename(filename)?;

        if bytes.is_empty() {
            return Err(ValidationError::EmptyFile);
        }

        let size = bytes.len() as u64;
        if size > self.max_upload_bytes {
            return Err(ValidationError::TooLarge {
                size,
                limit: self.max_upload_bytes,
            });
        }

        Ok(file_type)
    }

    pub fn upload(
        &self,
        owner_id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> Result<UploadReceipt, ServiceError> {
        let file_type = self.validate(filename, bytes)?;

        let file_id = Uuid::new_v4().to_string();
        let stored_name = format!("{}_{}", file_id, sanitize::safe_file_name(filename));
        let path = self.upload_dir.join(&stored_name);

        std::fs::create_dir_all(&self.upload_dir).map_err(|e| ServiceError::WriteUpload {
            path: self.upload_dir.clone(),
            source: e,
        })?;
        std::fs::write(&path, bytes).map_err(|e| ServiceError::WriteUpload {
            path: path.clone(),
            source: e,
        })?;
        let artifact = ArtifactGuard::new(&path);

        let mime_type = mime_guess::from_path(filename)
            .first()
            .map(|m| m.essence_str().to_string());

        let record = self.store.create(NewFileRecord {
            id: file_id.clone(),
            filename: stored_name,
            original_filename: filename.to_string(),
            file_type,
            mime_type,
            file_size: bytes.len() as u64,
            owner_id,
        })?;

        let job = ProcessingJob::new(
            &file_id,
            owner_id,
            artifact.path(),
            file_type,
            filename,
        );

        if let Err(e) = self.pool.submit(job) {
            warn!("Could not queue file {}: {}", file_id, e);
            if let Err(store_err) = self.store.update_error(&file_id, &e.to_string()) {
                warn!("Failed to mark file {} as failed: {}", file_id, store_err);
            }
            return Err(e.into());
        }
        artifact.release();

        info!(
            "Accepted {} upload {} ({} bytes) for owner {}",
            file_type,
            sanitize::safe_file_name(filename),
            record.file_size,
            owner_id
        );

        Ok(UploadReceipt {
            file_id,
            filename: record.original_filename,
            file_type,
            status: record.status,
            message: UPLOAD_ACCEPTED_MESSAGE.to_string(),
        })
    }
}
