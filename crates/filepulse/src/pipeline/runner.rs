use std::sync::Arc;

use tracing::info_span;

use crate::broadcast::{FileEvent, ProgressBroadcaster};
use crate::files::FileStatus;
use crate::parser::{ParsedContent, ParserRegistry};
use crate::sanitize;
use crate::store::FileStore;
use crate::worker::job::{ProcessingJob, ProcessingOutcome};

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::PipelineError;
use super::progress::BroadcastProgress;

/// Drives one file from `uploading` to `ready` or `failed`.
///
/// Every run ends in a terminal state: failures are written to the store
/// and published, never returned.
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    parsers: Arc<ParserRegistry>,
    store: Arc<dyn FileStore>,
    broadcaster: Arc<ProgressBroadcaster>,
}

impl Pipeline {
    pub fn new(
        config: Arc<PipelineConfig>,
        parsers: Arc<ParserRegistry>,
        store: Arc<dyn FileStore>,
        broadcaster: Arc<ProgressBroadcaster>,
    ) -> Self {
        Self {
            config,
            parsers,
            store,
            broadcaster,
        }
    }

    /// Processes a single upload. The upload artifact is removed before
    /// this returns, including when the run unwinds.
    pub fn run(&self, job: ProcessingJob) -> ProcessingOutcome {
        let ctx = PipelineContext::new(job);
        let filename = sanitize::redact_path(&ctx.job.path);
        let _pipeline_span = info_span!("pipeline",
            file_id = %ctx.job.file_id,
            file_type = %ctx.job.file_type,
            filename = %filename,
        )
        .entered();

        let progress = BroadcastProgress::new(
            &ctx.job.file_id,
            Arc::clone(&self.store),
            Arc::clone(&self.broadcaster),
            ctx.started,
        );

        match self.execute(&ctx, &progress) {
            Ok(processing_time) => {
                log::info!(
                    "File {} processed successfully in {}s",
                    ctx.job.file_id,
                    processing_time
                );
                ProcessingOutcome::ready(&ctx.job, processing_time)
            }
            Err(e) => {
                let message = e.user_message();
                log::error!("File {} processing failed: {}", ctx.job.file_id, e);
                self.mark_failed(&ctx.job.file_id, &message);
                ProcessingOutcome::failed(&ctx.job, message, ctx.elapsed_secs())
            }
        }
    }

    fn execute(
        &self,
        ctx: &PipelineContext,
        progress: &BroadcastProgress,
    ) -> Result<i64, PipelineError> {
        {
            let _step = info_span!("begin").entered();
            self.step_begin(ctx)?;
        }

        {
            let _step = info_span!("checkpoints").entered();
            self.step_checkpoints(progress)?;
        }

        let content = {
            let _step = info_span!("parse").entered();
            self.step_parse(ctx, progress)?
        };

        let _step = info_span!("finish").entered();
        self.step_finish(ctx, &content)
    }

    fn step_begin(&self, ctx: &PipelineContext) -> Result<(), PipelineError> {
        let file_id = &ctx.job.file_id;
        let record = self
            .store
            .get_by_owner(file_id, ctx.job.owner_id)?
            .ok_or_else(|| PipelineError::record_missing(file_id))?;

        if record.status != FileStatus::Uploading {
            return Err(PipelineError::InvalidTransition {
                from: record.status,
                to: FileStatus::Processing,
            });
        }

        if !self
            .store
            .update_progress(file_id, 0, Some(FileStatus::Processing), None)?
        {
            return Err(PipelineError::record_missing(file_id));
        }
        self.broadcaster.publish(file_id, &FileEvent::started());
        Ok(())
    }

    fn step_checkpoints(&self, progress: &BroadcastProgress) -> Result<(), PipelineError> {
        for &checkpoint in &self.config.checkpoints {
            if !self.config.tick_interval.is_zero() {
                std::thread::sleep(self.config.tick_interval);
            }
            progress.checkpoint(checkpoint)?;
        }
        Ok(())
    }

    fn step_parse(
        &self,
        ctx: &PipelineContext,
        progress: &BroadcastProgress,
    ) -> Result<ParsedContent, PipelineError> {
        // 100 is reserved for the ready transition.
        progress.open_band(99);
        let content = self
            .parsers
            .parse(&ctx.job.path, ctx.job.file_type, progress)?;

        if let Some(e) = progress.take_error() {
            return Err(e);
        }
        Ok(content)
    }

    fn step_finish(
        &self,
        ctx: &PipelineContext,
        content: &ParsedContent,
    ) -> Result<i64, PipelineError> {
        let file_id = &ctx.job.file_id;
        let processing_time = ctx.elapsed_secs();
        let metadata = content.metadata(ctx.job.file_type, processing_time);
        let value = serde_json::to_value(content)?;

        if !self.store.update_content(
            file_id,
            &value,
            Some(&metadata),
            FileStatus::Ready,
            processing_time,
        )? {
            return Err(PipelineError::record_missing(file_id));
        }

        self.broadcaster
            .publish(file_id, &FileEvent::ready(processing_time));
        Ok(processing_time)
    }

    /// Writes the failed state and tells observers. Nothing here can fail
    /// the caller: store and delivery problems are only logged.
    pub fn mark_failed(&self, file_id: &str, message: &str) {
        match self.store.update_error(file_id, message) {
            Ok(true) => {}
            Ok(false) => {
                log::warn!(
                    "File {} was already finished or removed; failure not recorded",
                    file_id
                );
                return;
            }
            Err(e) => log::error!("Failed to record failure for file {}: {}", file_id, e),
        }
        self.broadcaster.publish(file_id, &FileEvent::failed(message));
    }
}
