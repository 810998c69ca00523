//! Config file loading.

use crate::schema::ArgotConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the Argot config directory.
/// Priority: `ARGOT_CONFIG_DIR` env > `~/.argot/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ARGOT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".argot"),
        None => PathBuf::from(".argot"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Parse a YAML document. An empty document yields the defaults.
pub fn parse_config(raw: &str) -> Result<ArgotConfig> {
    if raw.trim().is_empty() {
        return Ok(ArgotConfig::default());
    }
    serde_yaml::from_str(raw).context("Failed to parse config YAML")
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist (first run).
pub async fn load_config(path: &Path) -> Result<ArgotConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(ArgotConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw).with_context(|| format!("In config file: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("argot-config-{}-{name}", std::process::id()))
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let cfg = load_config(&scratch("missing.yaml")).await.unwrap();
        assert!(cfg.commands.is_none());
    }

    #[tokio::test]
    async fn reads_file_from_disk() {
        let path = scratch("present.yaml");
        fs::write(&path, "commands:\n  prefix: \"?\"\n").await.unwrap();
        let cfg = load_config(&path).await.unwrap();
        fs::remove_file(&path).await.unwrap();
        assert_eq!(cfg.commands().prefix(), "?");
    }

    #[tokio::test]
    async fn malformed_yaml_is_an_error() {
        let path = scratch("broken.yaml");
        fs::write(&path, "commands: [unclosed\n").await.unwrap();
        let result = load_config(&path).await;
        fs::remove_file(&path).await.unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn blank_document_is_default() {
        assert!(parse_config("  \n").unwrap().logging.is_none());
    }

    #[test]
    fn config_file_lives_in_dir() {
        assert_eq!(config_file_path(Path::new("/etc/argot")), PathBuf::from("/etc/argot/config.yaml"));
    }
}
