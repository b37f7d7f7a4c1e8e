// JSON file backend: one `<key>.json` array per key

use super::{Persistence, parse_tasks, validate_key};
use crate::error::StorageError;
use crate::task::Task;
use eyre::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Stores each key as a pretty-printed JSON array in a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    base_path: PathBuf,
}

impl JsonFileStore {
    /// Open or create a store in the given directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.lock", key))
    }
}

impl Persistence for JsonFileStore {
    fn load(&self, key: &str) -> Vec<Task> {
        if let Err(e) = validate_key(key) {
            warn!(key, error = %e, "Refusing to load invalid key");
            return Vec::new();
        }

        let path = self.file_path(key);
        if !path.exists() {
            // Nothing saved yet
            debug!(file = ?path, "No task file, starting empty");
            return Vec::new();
        }

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(file = ?path, error = ?e, "Failed to read task file, starting empty");
                return Vec::new();
            }
        };

        let tasks = parse_tasks("json", key, &raw);
        info!(file = ?path, count = tasks.len(), "Loaded tasks from JSON file");
        tasks
    }

    fn save(&self, key: &str, tasks: &[Task]) -> Result<(), StorageError> {
        validate_key(key)?;

        let lock_path = self.lock_path(key);
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StorageError::io(&lock_path, e))?;

        // Acquire exclusive lock before writing
        lock.lock_exclusive()
            .map_err(|e| StorageError::Lock(format!("{}: {}", lock_path.display(), e)))?;

        let json = serde_json::to_string_pretty(tasks)?;

        // Write to a sibling and rename so readers never see a torn file
        let path = self.file_path(key);
        let tmp_path = self.base_path.join(format!("{}.json.tmp", key));
        {
            let mut file = File::create(&tmp_path).map_err(|e| StorageError::io(&tmp_path, e))?;
            file.write_all(json.as_bytes())
                .and_then(|_| file.sync_all())
                .map_err(|e| StorageError::io(&tmp_path, e))?;
        }
        fs::rename(&tmp_path, &path).map_err(|e| StorageError::io(&path, e))?;

        debug!(file = ?path, count = tasks.len(), "Saved tasks to JSON file");

        // Lock is automatically released when file is dropped
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.base_path.display())
    }
}
