pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod runner;

pub use config::PipelineConfig;
pub use context::{ArtifactGuard, PipelineContext};
pub use error::{PipelineError, INTERNAL_FAILURE_MESSAGE, UNREADABLE_UPLOAD_MESSAGE};
pub use progress::{BroadcastProgress, NoopProgress, ProgressReporter};
pub use runner::Pipeline;
