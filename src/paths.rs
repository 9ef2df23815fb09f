//! Path utilities for livekv.
//!
//! Provides centralized path resolution for persisted files:
//!
//! - [`get_livekv_dir`] - base directory for all livekv data
//! - [`default_storage_path`] - `<base>/storage.redb` (the persistent store)
//! - [`default_config_path`] - `<base>/livekv.toml` (optional settings)

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable overriding the base directory.
pub const HOME_ENV: &str = "LIVEKV_HOME";

/// Get the livekv base directory.
///
/// Resolution order:
/// 1. `LIVEKV_HOME` environment variable (if set and non-empty)
/// 2. `<local data dir>/livekv` (e.g. `~/.local/share/livekv` on Linux)
///
/// # Errors
///
/// Returns an error if neither is available, which is how a host without a
/// writable data location shows up.
pub fn get_livekv_dir() -> Result<PathBuf> {
    resolve_livekv_dir(std::env::var(HOME_ENV).ok(), dirs::data_local_dir())
}

fn resolve_livekv_dir(home: Option<String>, data_dir: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(home) = home
        && !home.is_empty()
    {
        return Ok(PathBuf::from(home));
    }

    let data_dir = data_dir.context("Failed to get local data directory")?;
    Ok(data_dir.join("livekv"))
}

/// Get the default persistent store path: `<base>/storage.redb`
pub fn default_storage_path() -> Result<PathBuf> {
    Ok(get_livekv_dir()?.join("storage.redb"))
}

/// Get the default config path: `<base>/livekv.toml`
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_livekv_dir()?.join("livekv.toml"))
}
