use thiserror::Error;

use crate::error::{ParseError, StoreError};
use crate::files::FileStatus;

pub const INTERNAL_FAILURE_MESSAGE: &str = "Processing failed: internal error";
pub const UNREADABLE_UPLOAD_MESSAGE: &str = "Parsing failed: could not read uploaded file";

/// Failure of a single processing run. Never escapes the worker; it is
/// recorded on the file and published to observers.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("File {file_id} no longer exists")]
    RecordMissing { file_id: String },

    #[error("Cannot move file from {from} to {to}")]
    InvalidTransition { from: FileStatus, to: FileStatus },

    #[error("Failed to encode parsed content: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Worker panicked: {0}")]
    Panicked(String),
}

impl PipelineError {
    pub fn record_missing(file_id: &str) -> Self {
        Self::RecordMissing {
            file_id: file_id.to_string(),
        }
    }

    /// Message stored on the file and sent to observers. Only the parser's
    /// diagnosis of the content is passed through; paths, database errors
    /// and panic payloads stay in the log.
    pub fn user_message(&self) -> String {
        match self {
            Self::Parse(ParseError::ReadFile { .. }) => UNREADABLE_UPLOAD_MESSAGE.to_string(),
            Self::Parse(e) => format!("Parsing failed: {}", e),
            _ => INTERNAL_FAILURE_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failures_are_labelled() {
        let err = PipelineError::from(ParseError::Json("EOF while parsing".to_string()));
        assert_eq!(
            err.user_message(),
            "Parsing failed: Invalid JSON: EOF while parsing"
        );
    }

    #[test]
    fn test_other_failures_are_generic() {
        let errors = [
            PipelineError::Panicked("index out of bounds at src/parser.rs:12".to_string()),
            PipelineError::InvalidTransition {
                from: FileStatus::Ready,
                to: FileStatus::Processing,
            },
            PipelineError::record_missing("f1"),
            PipelineError::Store(StoreError::InvalidRow {
                id: "f1".to_string(),
                reason: "database disk image is malformed".to_string(),
            }),
        ];

        for err in errors {
            assert_eq!(err.user_message(), INTERNAL_FAILURE_MESSAGE, "{:?}", err);
        }
    }

    #[test]
    fn test_read_failure_hides_path() {
        let err = PipelineError::from(ParseError::ReadFile {
            path: "/srv/secret/uploads/p1_x.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        });

        let message = err.user_message();
        assert_eq!(message, UNREADABLE_UPLOAD_MESSAGE);
        assert!(!message.contains("/srv"));
        assert!(err.to_string().contains("/srv/secret"));
    }
}
