//! File entity data model and its processing state machine.

pub mod file_type;
pub mod record;

pub use file_type::FileType;
pub use record::{FileMetadata, FileRecord, FileStatus, NewFileRecord};
