// Configuration loading

use crate::persist::Backend;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "taskmaster";
const CONFIG_FILE: &str = "taskmaster.yml";

/// Top-level configuration, read from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub suggest: SuggestConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    /// Store directory; defaults to the platform data dir
    pub path: Option<PathBuf>,
    /// Key the task collection is saved under
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            path: None,
            key: "tasks".to_string(),
        }
    }
}

impl StorageConfig {
    /// Resolved store directory
    pub fn store_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_store_path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            model: "claude-3-5-haiku-latest".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            max_tokens: 1024,
            timeout_ms: 30_000,
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// Uses `explicit` when given (it must exist). Otherwise the first of
    /// `<config dir>/taskmaster/taskmaster.yml` and `./taskmaster.yml` that
    /// exists, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidates = dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .into_iter()
            .chain(std::iter::once(PathBuf::from(CONFIG_FILE)));

        for candidate in candidates {
            if candidate.exists() {
                return Self::from_file(&candidate);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!(file = ?path, "Loaded config");
        Ok(config)
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.backend, Backend::Json);
        assert_eq!(config.storage.key, "tasks");
        assert_eq!(config.suggest.api_key_env, "ANTHROPIC_API_KEY");
        assert!(config.storage.store_path().ends_with("taskmaster"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("taskmaster.yml");
        fs::write(
            &path,
            "storage:\n  backend: sqlite\n  path: /tmp/tm\nsuggest:\n  timeout_ms: 500\n",
        )
        .unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.storage.backend, Backend::Sqlite);
        assert_eq!(config.storage.store_path(), PathBuf::from("/tmp/tm"));
        assert_eq!(config.storage.key, "tasks");
        assert_eq!(config.suggest.timeout_ms, 500);
        assert_eq!(config.suggest.max_tokens, 1024);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(Config::load(Some(temp.path().join("nope.yml").as_path())).is_err());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yml");
        fs::write(&path, "storage:\n  backend: floppy\n").unwrap();
        assert!(Config::from_file(&path).is_err());
    }
}
