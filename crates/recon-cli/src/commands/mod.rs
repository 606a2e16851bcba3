//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod output;
pub mod reconcile;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use recon_core::ReconConfig;

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("recon")
        .join("config.json")
}

/// Configuration file in effect: `-c` if given, the default location otherwise.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load configuration. An explicit path must exist; the default location
/// falls back to built-in defaults.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<ReconConfig> {
    if let Some(path) = explicit {
        return ReconConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path));
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Loading config from {}", path.display());
        Ok(ReconConfig::from_file(&path)?)
    } else {
        Ok(ReconConfig::default())
    }
}

/// Read a JSON document into `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Replace `path` with `value` as pretty JSON, writing a sibling temp file
/// first so readers never see a partial file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(value)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Output path has no file name")?;
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&tmp_path, content)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }
    Ok(())
}
