//! Config file discovery and loading.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info};

use super::Config;

/// Where the loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// `$XDG_CONFIG_HOME/waychord/config.toml` (or `~/.config/...`).
    Primary,
    /// No file found; builtin defaults.
    Default,
}

pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
}

pub(crate) fn config_path() -> Option<PathBuf> {
    let base = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("waychord").join("config.toml"))
}

impl Config {
    /// Loads the config file if present, falling back to defaults.
    ///
    /// Out-of-range values are clamped after parsing; a parse failure is an
    /// error so a typo does not silently revert every setting.
    pub fn load() -> Result<LoadedConfig> {
        let Some(path) = config_path() else {
            debug!("No config directory available, using defaults");
            return Ok(LoadedConfig {
                config: Config::default(),
                source: ConfigSource::Default,
            });
        };

        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(LoadedConfig {
                config: Config::default(),
                source: ConfigSource::Default,
            });
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: Config = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate_and_clamp();
        info!("Loaded configuration from {}", path.display());
        Ok(LoadedConfig {
            config,
            source: ConfigSource::Primary,
        })
    }
}
