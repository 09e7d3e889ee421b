use std::path::PathBuf;

use serde::Serialize;

use crate::files::{FileStatus, FileType};

/// One upload waiting to be processed.
#[derive(Debug, Clone)]
pub struct ProcessingJob {
    pub file_id: String,
    pub owner_id: i64,
    /// Upload artifact on disk. Removed when processing ends.
    pub path: PathBuf,
    pub file_type: FileType,
    pub original_filename: String,
}

impl ProcessingJob {
    pub fn new(
        file_id: impl Into<String>,
        owner_id: i64,
        path: impl Into<PathBuf>,
        file_type: FileType,
        original_filename: impl Into<String>,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            owner_id,
            path: path.into(),
            file_type,
            original_filename: original_filename.into(),
        }
    }
}

/// Terminal result of a processing run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingOutcome {
    pub file_id: String,
    pub status: FileStatus,
    pub processing_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingOutcome {
    pub fn ready(job: &ProcessingJob, processing_time: i64) -> Self {
        Self {
            file_id: job.file_id.clone(),
            status: FileStatus::Ready,
            processing_time,
            error: None,
        }
    }

    pub fn failed(job: &ProcessingJob, error: String, processing_time: i64) -> Self {
        Self {
            file_id: job.file_id.clone(),
            status: FileStatus::Failed,
            processing_time,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FileStatus::Ready
    }
}
