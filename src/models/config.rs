//! Configuration model.

use super::rules::{CategoryFilters, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::core::executor::ExecutorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Image extensions.
    pub image_extensions: Vec<String>,
    /// Video extensions.
    pub video_extensions: Vec<String>,
    /// Name of the hidden per-folder staging directory.
    pub staging_dir_name: String,
    /// Minimum interval between progress events in milliseconds.
    pub progress_interval_ms: u64,
    /// Capacity of the progress channel.
    pub channel_capacity: usize,
    /// Directory for run logs and journals.
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_extensions: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            video_extensions: VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            staging_dir_name: ".temp".to_string(),
            progress_interval_ms: 200,
            channel_capacity: 256,
            log_dir: dirs_config_path().join("logs"),
        }
    }
}

impl Config {
    /// Category filters built from the configured extensions.
    pub fn filters(&self) -> CategoryFilters {
        CategoryFilters::new(&self.image_extensions, &self.video_extensions)
    }

    /// Executor settings derived from this configuration.
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            staging_dir_name: self.staging_dir_name.clone(),
            progress_interval: Duration::from_millis(self.progress_interval_ms),
            channel_capacity: self.channel_capacity.max(1),
        }
    }
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folder_organizer")
}

/// Load configuration from file.
pub fn load_config() -> Config {
    let config_path = dirs_config_path().join("config.toml");

    if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring invalid config {:?}: {}", config_path, e),
            },
            Err(e) => tracing::warn!("Cannot read config {:?}: {}", config_path, e),
        }
    }

    Config::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.staging_dir_name, ".temp");
        assert_eq!(config.progress_interval_ms, 200);
        assert!(config.image_extensions.contains(&"jpg".to_string()));
        assert!(config.video_extensions.contains(&"mkv".to_string()));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("staging_dir_name = \".backup\"\n").unwrap();
        assert_eq!(config.staging_dir_name, ".backup");
        assert_eq!(config.channel_capacity, 256);
        let exec = config.executor_config();
        assert_eq!(exec.progress_interval, Duration::from_millis(200));
    }
}
