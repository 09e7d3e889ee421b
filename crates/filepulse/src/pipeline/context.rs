use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::sanitize;
use crate::worker::job::ProcessingJob;

/// Removes the upload artifact when dropped, whatever the outcome of the run.
pub struct ArtifactGuard {
    path: PathBuf,
    armed: bool,
}

impl ArtifactGuard {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hands the artifact over to a new owner; nothing is removed on drop.
    pub fn release(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::info!(
                "Temporary file {} cleaned up",
                sanitize::redact_path(&self.path)
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove temporary file {}: {}",
                sanitize::redact_path(&self.path),
                e
            ),
        }
    }
}

/// State owned by one processing run.
pub struct PipelineContext {
    pub job: ProcessingJob,
    pub started: Instant,
    pub artifact: ArtifactGuard,
}

impl PipelineContext {
    pub fn new(job: ProcessingJob) -> Self {
        let artifact = ArtifactGuard::new(&job.path);
        Self {
            job,
            started: Instant::now(),
            artifact,
        }
    }

    /// Whole seconds since the run started.
    pub fn elapsed_secs(&self) -> i64 {
        elapsed_secs(self.started)
    }
}

pub(crate) fn elapsed_secs(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_secs()).unwrap_or(i64::MAX)
}
