pub mod job;
pub mod pool;

pub use job::{ProcessingJob, ProcessingOutcome};
pub use pool::WorkerPool;
