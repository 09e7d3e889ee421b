use std::time::Duration;

use crate::config::Config;

pub const DEFAULT_CHECKPOINTS: [u8; 4] = [20, 40, 60, 80];
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Progress values reported before parsing, strictly ascending.
    pub checkpoints: Vec<u8>,
    /// Pause before each checkpoint. Zero disables pacing.
    pub tick_interval: Duration,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            checkpoints: config.progress.checkpoints.clone(),
            tick_interval: Duration::from_millis(config.progress.tick_interval_ms),
        }
    }

    /// Default checkpoints without any pacing.
    pub fn immediate() -> Self {
        Self {
            tick_interval: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Highest checkpoint, or 0 when there are none.
    pub fn last_checkpoint(&self) -> u8 {
        self.checkpoints.last().copied().unwrap_or(0)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            checkpoints: DEFAULT_CHECKPOINTS.to_vec(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}
