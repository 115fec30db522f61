//! Application configuration.
//!
//! romcheck keeps its state (the SQLite store) in a per-user
//! configuration directory. The location is resolved from, in priority
//! order:
//!
//! 1. The `--config` flag, with the `ROMCHECK_CONFIG` environment
//!    variable as its fallback (both handled by the CLI layer)
//! 2. The platform config directory via `directories::ProjectDirs`
//!    (XDG on Linux, AppData on Windows)

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

/// Environment variable overriding the configuration directory;
/// read by the CLI layer as the `--config` fallback.
pub const CONFIG_ENV_VAR: &str = "ROMCHECK_CONFIG";

/// File name of the SQLite store inside the config directory.
const STORE_FILE_NAME: &str = "romcheck.db";

/// Resolve the configuration directory, creating it if necessary.
pub fn config_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir,
        None => ProjectDirs::from("com", "romcheck", "romcheck")
            .ok_or_else(|| anyhow!("failed to determine project directories"))?
            .config_dir()
            .to_path_buf(),
    };
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    if !dir.is_dir() {
        return Err(anyhow!("config path {} is not a directory", dir.display()));
    }
    Ok(dir)
}

/// Path of the SQLite store file.
pub fn store_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    Ok(config_dir(explicit)?.join(STORE_FILE_NAME))
}
