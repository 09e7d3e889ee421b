pub mod app;
pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod files;
pub mod intake;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod queries;
pub mod sanitize;
pub mod store;
pub mod worker;

pub use app::FilePulse;
pub use broadcast::{EventEnvelope, FileEvent, ProgressBroadcaster, Subscription};
pub use config::{load_config, Config};
pub use error::{
    ConfigError, FilePulseError, NotifyError, ParseError, Result, ServiceError, StoreError,
    ValidationError, WorkerError,
};
pub use files::{FileMetadata, FileRecord, FileStatus, FileType, NewFileRecord};
pub use intake::{UploadIntake, UploadReceipt};
pub use parser::{ParsedContent, ParserRegistry};
pub use pipeline::{Pipeline, PipelineConfig, ProgressReporter};
pub use queries::FileQueries;
pub use store::{FileStore, SqliteFileStore};
pub use worker::{ProcessingJob, ProcessingOutcome, WorkerPool};
