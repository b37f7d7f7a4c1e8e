// Persistence backends for the task collection
//
// A backend is a key/value store holding one ordered JSON array of tasks per
// key. Loading never fails: missing or unreadable data degrades to an empty
// collection with a warning. Saving reports failures so the caller can warn.

mod json_file;
mod memory;
mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::StorageError;
use crate::task::Task;
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Load/save contract used by the task store
pub trait Persistence: Send {
    /// Read the collection stored under `key`, or an empty one
    fn load(&self, key: &str) -> Vec<Task>;

    /// Replace the collection stored under `key`
    fn save(&self, key: &str, tasks: &[Task]) -> Result<(), StorageError>;

    /// Short human-readable description for logs
    fn describe(&self) -> String;
}

/// Which backend to persist with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Json,
    Sqlite,
    Memory,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Json => write!(f, "json"),
            Backend::Sqlite => write!(f, "sqlite"),
            Backend::Memory => write!(f, "memory"),
        }
    }
}

/// Open the configured backend rooted at `path`
pub fn open_backend(backend: Backend, path: &Path) -> Result<Box<dyn Persistence>> {
    let store: Box<dyn Persistence> = match backend {
        Backend::Json => Box::new(JsonFileStore::open(path)?),
        Backend::Sqlite => Box::new(SqliteStore::open(path)?),
        Backend::Memory => Box::new(MemoryStore::new()),
    };
    Ok(store)
}

/// Storage keys double as file names, so keep them boring
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.len() > 64 {
        return Err(StorageError::InvalidKey(format!("{} (max 64 chars)", key)));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(StorageError::InvalidKey(format!(
            "{} (must be alphanumeric with _/-)",
            key
        )));
    }
    Ok(())
}

/// Parse a stored task array, degrading to empty on malformed content
pub(crate) fn parse_tasks(source: &str, key: &str, raw: &str) -> Vec<Task> {
    match serde_json::from_str::<Vec<Task>>(raw) {
        Ok(tasks) => tasks,
        Err(e) => {
            warn!(source, key, error = ?e, "Failed to parse stored tasks, starting empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_key() {
        // Valid
        assert!(validate_key("tasks").is_ok());
        assert!(validate_key("work-tasks_2").is_ok());

        // Invalid
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a b").is_err());
        assert!(validate_key(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_parse_tasks_malformed() {
        assert!(parse_tasks("test", "tasks", "{not json").is_empty());
        assert!(parse_tasks("test", "tasks", r#"{"id":"a"}"#).is_empty());
        assert_eq!(parse_tasks("test", "tasks", "[]").len(), 0);
    }

    #[test]
    fn test_backend_parse() {
        let backend: Backend = serde_yaml::from_str("sqlite").unwrap();
        assert_eq!(backend, Backend::Sqlite);
        assert_eq!(Backend::default(), Backend::Json);
        assert_eq!(Backend::Json.to_string(), "json");
    }

    #[test]
    fn test_open_backend_round_trip_each_kind() {
        let tasks = vec![Task::new("a", "A", 1), Task::new("b", "B", 2)];

        for backend in [Backend::Json, Backend::Sqlite] {
            let temp = TempDir::new().unwrap();
            let store = open_backend(backend, temp.path()).unwrap();
            store.save("tasks", &tasks).unwrap();
            assert_eq!(store.load("tasks"), tasks, "backend {}", backend);
            assert!(store.load("other").is_empty());
        }
    }
}
