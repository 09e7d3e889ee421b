use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilePulseError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Rejections raised by upload intake before any record exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No file provided")]
    MissingFilename,

    #[error("Unsupported file type: {extension}")]
    UnsupportedType { extension: String },

    #[error("File is empty")]
    EmptyFile,

    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Limit must be between 1 and {max}, got {limit}")]
    InvalidLimit { limit: u64, max: u64 },

    #[error("Search term must not be empty")]
    EmptySearchTerm,
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid CSV: {0}")]
    Csv(String),

    #[error("Invalid spreadsheet: {0}")]
    Excel(String),

    #[error("Invalid PDF: {0}")]
    Pdf(String),

    #[error("Invalid JSON: {0}")]
    Json(String),
}

/// Delivery failure for a single observer. Never escapes `publish`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Observer connection closed")]
    Closed,

    #[error("Observer is not keeping up")]
    Full,

    #[error("Failed to encode event: {0}")]
    Serialize(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] crate::db::DatabaseError),

    #[error("Failed to encode stored JSON: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Corrupt row for file {id}: {reason}")]
    InvalidRow { id: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("Worker pool is shut down")]
    ChannelClosed,

    #[error("Processing queue is full")]
    QueueFull,
}

/// Errors surfaced to callers of the owner-facing operations.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("File not found: {file_id}")]
    NotFound { file_id: String },

    #[error("Failed to write upload '{path}': {source}")]
    WriteUpload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

impl ServiceError {
    pub fn not_found(file_id: &str) -> Self {
        Self::NotFound {
            file_id: file_id.to_string(),
        }
    }

    /// True for errors caused by the request itself rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, FilePulseError>;
