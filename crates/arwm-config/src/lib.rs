mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

const APP_DIR: &str = "arwm";
const CONFIG_FILE: &str = "config.toml";

/// Per-user config directory, created on first use.
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("no platform config directory")?
        .join(APP_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Read the config file, falling back to defaults when none exists yet.
/// A file that exists but fails to parse is an error, not a silent
/// fallback, so a typo does not wipe the user's tuning.
pub fn load_config() -> Result<AppConfig> {
    let path = config_path()?;
    if !path.exists() {
        info!("no config file, using defaults");
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    let config = toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
    info!(?path, "config loaded");
    Ok(config)
}

/// Persist the current config; called on shutdown.
pub fn save_config(config: &AppConfig) -> Result<()> {
    let path = config_path()?;
    std::fs::write(&path, toml::to_string_pretty(config)?)?;
    info!(?path, "config saved");
    Ok(())
}
