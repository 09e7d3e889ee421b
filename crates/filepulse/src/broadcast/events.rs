//! Event payloads pushed to observers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::files::FileStatus;

/// Envelope `type` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StatusUpdate,
    ProgressUpdate,
}

/// An event emitted by the pipeline for one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileEvent {
    /// Processing has begun.
    Started { message: String },
    /// A progress checkpoint was reached.
    Progress { progress: u8, processing_time: i64 },
    /// Terminal success.
    Ready {
        message: String,
        processing_time: i64,
    },
    /// Terminal failure.
    Failed { error_message: String },
}

impl FileEvent {
    pub fn started() -> Self {
        Self::Started {
            message: "File processing started".to_string(),
        }
    }

    pub fn progress(progress: u8, processing_time: i64) -> Self {
        Self::Progress {
            progress,
            processing_time,
        }
    }

    pub fn ready(processing_time: i64) -> Self {
        Self::Ready {
            message: "File processed successfully".to_string(),
            processing_time,
        }
    }

    pub fn failed(error_message: impl Into<String>) -> Self {
        Self::Failed {
            error_message: error_message.into(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Progress { .. } => EventKind::ProgressUpdate,
            _ => EventKind::StatusUpdate,
        }
    }

    pub fn status(&self) -> FileStatus {
        match self {
            Self::Started { .. } | Self::Progress { .. } => FileStatus::Processing,
            Self::Ready { .. } => FileStatus::Ready,
            Self::Failed { .. } => FileStatus::Failed,
        }
    }

    pub fn data(&self) -> EventData {
        let mut data = EventData {
            status: self.status(),
            progress: None,
            processing_time: None,
            error_message: None,
            message: None,
        };

        match self {
            Self::Started { message } => {
                data.message = Some(message.clone());
            }
            Self::Progress {
                progress,
                processing_time,
            } => {
                data.progress = Some(*progress);
                data.processing_time = Some(*processing_time);
            }
            Self::Ready {
                message,
                processing_time,
            } => {
                data.message = Some(message.clone());
                data.processing_time = Some(*processing_time);
            }
            Self::Failed { error_message } => {
                data.error_message = Some(error_message.clone());
            }
        }

        data
    }
}

/// The `data` object of an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Wire format delivered to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub file_id: String,
    pub data: EventData,
    pub timestamp: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(file_id: &str, event: &FileEvent) -> Self {
        Self {
            kind: event.kind(),
            file_id: file_id.to_string(),
            data: event.data(),
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, NotifyError> {
        serde_json::to_string(self).map_err(|e| NotifyError::Serialize(e.to_string()))
    }

    pub fn is_terminal(&self) -> bool {
        self.data.status.is_terminal()
    }
}
