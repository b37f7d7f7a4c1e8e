// In-memory backend, mostly for tests and throwaway sessions

use super::{Persistence, parse_tasks, validate_key};
use crate::error::StorageError;
use crate::task::Task;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Process-local key/value store. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<HashMap<String, String>>>,
    fail_saves: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following save fail with a storage error
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Store raw content under a key, bypassing serialization
    pub fn insert_raw(&self, key: &str, raw: impl Into<String>) {
        match self.state.write() {
            Ok(mut state) => {
                state.insert(key.to_string(), raw.into());
            }
            Err(e) => warn!(key, error = %e, "Memory store lock poisoned"),
        }
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.state.read().ok().and_then(|state| state.get(key).cloned())
    }
}

impl Persistence for MemoryStore {
    fn load(&self, key: &str) -> Vec<Task> {
        match self.raw(key) {
            Some(raw) => parse_tasks("memory", key, &raw),
            None => Vec::new(),
        }
    }

    fn save(&self, key: &str, tasks: &[Task]) -> Result<(), StorageError> {
        validate_key(key)?;

        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::io(
                format!("memory:{}", key),
                std::io::Error::other("simulated write failure"),
            ));
        }

        let json = serde_json::to_string(tasks)?;
        let mut state = self
            .state
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        state.insert(key.to_string(), json);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let store = MemoryStore::new();
        let handle = store.clone();

        store.save("tasks", &[Task::new("a", "A", 1)]).unwrap();
        assert_eq!(handle.load("tasks").len(), 1);
        assert_eq!(handle.save_count(), 1);
    }

    #[test]
    fn test_failing_saves() {
        let store = MemoryStore::new();
        store.set_fail_saves(true);

        assert!(matches!(store.save("tasks", &[]), Err(StorageError::Io { .. })));
        assert_eq!(store.save_count(), 0);
        assert!(store.raw("tasks").is_none());

        store.set_fail_saves(false);
        assert!(store.save("tasks", &[]).is_ok());
    }

    #[test]
    fn test_corrupt_content_loads_empty() {
        let store = MemoryStore::new();
        store.insert_raw("tasks", "[{\"id\":");
        assert!(store.load("tasks").is_empty());
    }
}
