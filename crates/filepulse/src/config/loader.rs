use std::path::Path;

use crate::config::schema::{Config, CONFIG_VERSION};
use crate::error::ConfigError;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(invalid(format!(
            "Unsupported config version: {}",
            config.version
        )));
    }

    if config.upload_directory.trim().is_empty() {
        return Err(invalid("upload_directory must not be empty"));
    }

    if config.worker_count == 0 {
        return Err(invalid("worker_count must be at least 1"));
    }

    if config.queue_capacity == 0 {
        return Err(invalid("queue_capacity must be at least 1"));
    }

    if config.max_upload_bytes == 0 {
        return Err(invalid("max_upload_bytes must be at least 1"));
    }

    let checkpoints = &config.progress.checkpoints;
    if let Some(bad) = checkpoints.iter().find(|c| !(1..=99).contains(*c)) {
        return Err(invalid(format!(
            "progress checkpoint {} is outside 1..=99",
            bad
        )));
    }
    if checkpoints.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid("progress checkpoints must be strictly ascending"));
    }

    if config.broadcast.observer_buffer == 0 {
        return Err(invalid("broadcast.observer_buffer must be at least 1"));
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(invalid(format!(
            "Unknown log level '{}'",
            config.logging.level
        )));
    }

    Ok(())
}
