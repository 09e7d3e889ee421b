use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::broadcast::{FileEvent, ProgressBroadcaster};
use crate::store::FileStore;

use super::context::elapsed_secs;
use super::error::PipelineError;

/// Receives incremental progress from a parser.
pub trait ProgressReporter: Send + Sync {
    /// `percent` is the reporter's own completion in `0..=100`.
    fn report(&self, percent: u8);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _percent: u8) {}
}

struct ProgressState {
    current: u8,
    band_floor: u8,
    band_ceiling: u8,
    error: Option<PipelineError>,
}

/// Persists and publishes progress for one file.
///
/// Progress only ever moves forward. Parser reports are mapped into the
/// band opened by [`BroadcastProgress::open_band`]; the first store failure
/// seen while handling them is kept for the pipeline to collect.
pub struct BroadcastProgress {
    file_id: String,
    store: Arc<dyn FileStore>,
    broadcaster: Arc<ProgressBroadcaster>,
    started: Instant,
    state: Mutex<ProgressState>,
}

impl BroadcastProgress {
    pub fn new(
        file_id: &str,
        store: Arc<dyn FileStore>,
        broadcaster: Arc<ProgressBroadcaster>,
        started: Instant,
    ) -> Self {
        Self {
            file_id: file_id.to_string(),
            store,
            broadcaster,
            started,
            state: Mutex::new(ProgressState {
                current: 0,
                band_floor: 0,
                band_ceiling: 0,
                error: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ProgressState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Progress state lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    pub fn current(&self) -> u8 {
        self.state().current
    }

    /// Records an absolute progress value. Values at or below the current
    /// progress are ignored.
    pub fn checkpoint(&self, progress: u8) -> Result<(), PipelineError> {
        let mut state = self.state();
        self.advance(&mut state, progress)
    }

    /// Maps subsequent parser reports onto `current..=ceiling`.
    pub fn open_band(&self, ceiling: u8) {
        let mut state = self.state();
        state.band_floor = state.current;
        state.band_ceiling = ceiling.max(state.current);
    }

    /// Returns the first failure hit while handling parser reports.
    pub fn take_error(&self) -> Option<PipelineError> {
        self.state().error.take()
    }

    fn advance(&self, state: &mut ProgressState, progress: u8) -> Result<(), PipelineError> {
        let progress = progress.min(100);
        if progress <= state.current {
            return Ok(());
        }

        // processing_time is only persisted with the terminal state.
        let elapsed = elapsed_secs(self.started);
        if !self
            .store
            .update_progress(&self.file_id, progress, None, None)?
        {
            return Err(PipelineError::record_missing(&self.file_id));
        }
        state.current = progress;

        self.broadcaster
            .publish(&self.file_id, &FileEvent::progress(progress, elapsed));
        log::debug!("File {} progress {}%", self.file_id, progress);
        Ok(())
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, percent: u8) {
        let mut state = self.state();
        if state.error.is_some() || state.band_ceiling <= state.band_floor {
            return;
        }

        let span = u32::from(state.band_ceiling - state.band_floor);
        let mapped = state.band_floor as u32 + span * u32::from(percent.min(100)) / 100;

        if let Err(e) = self.advance(&mut state, mapped as u8) {
            log::warn!("Progress update for file {} failed: {}", self.file_id, e);
            state.error = Some(e);
        }
    }
}
