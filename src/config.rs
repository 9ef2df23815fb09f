//! Configuration for backend detection.
//!
//! This module provides the settings that decide, once per store, which
//! physical store backs it:
//!
//! - [`StorageConfig`] - Root configuration struct
//! - [`BackendKind`] - Which backend to detect
//!
//! Settings come from an optional TOML file and `LIVEKV_*` environment
//! variables; environment values win.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable selecting the backend kind.
pub const BACKEND_ENV: &str = "LIVEKV_BACKEND";

/// Environment variable selecting the persistent store file.
pub const PATH_ENV: &str = "LIVEKV_PATH";

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Which physical store to look for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Persistent single-file store.
    #[default]
    File,
    /// Process-local store; survives only as long as the process.
    Memory,
    /// No physical store; the reactive layer caches in memory only.
    None,
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            "none" | "off" => Ok(Self::None),
            other => anyhow::bail!(
                "Invalid backend '{other}'. Valid backends: file, memory, none"
            ),
        }
    }
}

/// livekv.toml configuration structure.
///
/// ```toml
/// backend = "file"
/// path = "/var/lib/myapp/storage.redb"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Store file for the `file` backend; defaults to
    /// [`default_storage_path`](crate::paths::default_storage_path).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Config for a persistent store at an explicit path.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::File,
            path: Some(path.into()),
        }
    }

    /// Config for a process-local store.
    pub fn memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            path: None,
        }
    }

    /// Config with no physical store.
    pub fn none() -> Self {
        Self {
            backend: BackendKind::None,
            path: None,
        }
    }

    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - Fields have invalid types or unknown backend names
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: StorageConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Build configuration from `LIVEKV_BACKEND` and `LIVEKV_PATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if `LIVEKV_BACKEND` names an unknown backend.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable lookup (the environment, in practice).
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend variable names an unknown backend.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup(BACKEND_ENV)
            && !backend.is_empty()
        {
            self.backend = backend
                .parse()
                .with_context(|| format!("Invalid {BACKEND_ENV} value"))?;
        }

        if let Some(path) = lookup(PATH_ENV)
            && !path.is_empty()
        {
            self.path = Some(PathBuf::from(path));
        }

        Ok(self)
    }

    /// Validate configuration.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the `file` backend is given a path that exists
    /// but is a directory.
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut warnings = Vec::new();

        match (self.backend, &self.path) {
            (BackendKind::File, Some(path)) if path.is_dir() => {
                anyhow::bail!(
                    "Storage path is a directory: {}\n  \
                     Expected a file path such as {}/storage.redb",
                    path.display(),
                    path.display()
                );
            },
            (BackendKind::Memory | BackendKind::None, Some(path)) => {
                warnings.push(format!(
                    "Storage path {} is ignored by the '{:?}' backend",
                    path.display(),
                    self.backend
                ));
            },
            _ => {},
        }

        if self.backend == BackendKind::None {
            warnings.push(
                "Persistence is disabled; values live only as long as the store".to_string(),
            );
        }

        Ok(ValidationResult { warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_config() {
        let config: StorageConfig = toml::from_str("").unwrap();
        assert_eq!(config.backend, BackendKind::File);
        assert!(config.path.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
backend = "memory"
path = "/tmp/ignored.redb"
"#;
        let config: StorageConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.path, Some(PathBuf::from("/tmp/ignored.redb")));
    }

    #[test]
    fn test_parse_unknown_backend() {
        let result: std::result::Result<StorageConfig, _> = toml::from_str("backend = \"s3\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("livekv.toml");
        fs::write(&path, "backend = \"none\"\n").unwrap();

        let config = StorageConfig::load_from(&path).unwrap();
        assert_eq!(config.backend, BackendKind::None);
    }

    #[test]
    fn test_load_missing_file() {
        let err = StorageConfig::load_from("/nonexistent/livekv.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> =
            HashMap::from([(BACKEND_ENV, "Memory"), (PATH_ENV, "/data/store.redb")]);

        let config = StorageConfig::default()
            .with_overrides(|name| vars.get(name).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.path, Some(PathBuf::from("/data/store.redb")));
    }

    #[test]
    fn test_empty_overrides_are_ignored() {
        let config = StorageConfig::file("/keep.redb")
            .with_overrides(|_| Some(String::new()))
            .unwrap();

        assert_eq!(config.backend, BackendKind::File);
        assert_eq!(config.path, Some(PathBuf::from("/keep.redb")));
    }

    #[test]
    fn test_invalid_override() {
        let result = StorageConfig::default().with_overrides(|name| {
            (name == BACKEND_ENV).then(|| "localstorage".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_directory_path() {
        let tmp = TempDir::new().unwrap();
        let config = StorageConfig::file(tmp.path());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_warnings() {
        let config = StorageConfig {
            backend: BackendKind::Memory,
            path: Some(PathBuf::from("/tmp/x.redb")),
        };
        let result = config.validate().unwrap();
        assert!(result.has_warnings());

        let result = StorageConfig::none().validate().unwrap();
        assert_eq!(result.warnings.len(), 1);

        let result = StorageConfig::default().validate().unwrap();
        assert!(!result.has_warnings());
    }
}
