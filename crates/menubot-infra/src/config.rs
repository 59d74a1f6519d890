//! Configuration and prompt loading from the data directory.
//!
//! Reads `config.toml` into [`GlobalConfig`], falling back to defaults
//! when the file is missing or malformed (warn, never fail: a broken
//! config file should not take the service down). An optional
//! `prompt.md` overrides the built-in domain prompt.

use std::path::{Path, PathBuf};

use menubot_types::config::GlobalConfig;

/// Resolve the data directory: `MENUBOT_DATA_DIR`, else `~/.menubot`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MENUBOT_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".menubot")
}

/// Load global configuration from `{data_dir}/config.toml`.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("no config.toml at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Load the domain prompt override from `{data_dir}/prompt.md`, if any.
pub async fn load_system_prompt(data_dir: &Path) -> Option<String> {
    let path = data_dir.join("prompt.md");
    match tokio::fs::read_to_string(&path).await {
        Ok(content) if !content.trim().is_empty() => Some(content),
        Ok(_) => None,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            tracing::warn!("failed to read {}: {err}, using built-in prompt", path.display());
            None
        }
    }
}
