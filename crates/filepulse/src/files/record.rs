use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FileType;

/// Processing status of an uploaded file.
///
/// `Ready` and `Failed` are terminal: once written, the record accepts no
/// further status, progress or content changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Uploading,
    Processing,
    Ready,
    Failed,
}

impl FileStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }

    /// Returns whether `self -> next` is a legal transition.
    ///
    /// `Processing -> Processing` covers progress ticks. `Uploading -> Failed`
    /// covers uploads that could never be handed to a worker.
    pub fn can_transition_to(&self, next: FileStatus) -> bool {
        matches!(
            (self, next),
            (Self::Uploading, Self::Processing)
                | (Self::Uploading, Self::Failed)
                | (Self::Processing, Self::Processing)
                | (Self::Processing, Self::Ready)
                | (Self::Processing, Self::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploading" => Ok(Self::Uploading),
            "processing" => Ok(Self::Processing),
            "ready" => Ok(Self::Ready),
            "failed" => Ok(Self::Failed),
            other => Err(other.to_string()),
        }
    }
}

/// Summary derived from a successful parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_type: FileType,
    pub processing_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
}

/// Fields supplied when a record is first created. Status starts at `uploading`.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub id: String,
    /// Name of the artifact on disk.
    pub filename: String,
    /// Name as supplied by the uploader.
    pub original_filename: String,
    pub file_type: FileType,
    pub mime_type: Option<String>,
    pub file_size: u64,
    pub owner_id: i64,
}

/// A persisted file record.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub id: String,
    pub filename: String,
    pub original_filename: String,
    pub file_type: FileType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub file_size: u64,
    pub status: FileStatus,
    pub progress: u8,
    /// Structured parse result. Only present when `status` is `ready`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    /// Only present when `status` is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FileMetadata>,
    /// Elapsed seconds of the processing phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<i64>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}
