pub mod classify;
pub mod config_cmd;
pub mod init;
pub mod rules;
pub mod select;

use std::path::{Path, PathBuf};
use switchyard_config::{AppConfig, ConfigError};

/// Where the configuration lives: the `--config` path, or the default.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load the configuration from `explicit` (or the default path) with
/// environment overrides applied.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match explicit {
        None => AppConfig::load(),
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            config.apply_env(|key| std::env::var(key).ok())?;
            config.validate()?;
            Ok(config)
        }
    }
}
