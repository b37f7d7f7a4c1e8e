// SQLite backend: a single key/value table holding task arrays

use super::{Persistence, parse_tasks, validate_key};
use crate::error::StorageError;
use crate::task::{Task, now_ms};
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CURRENT_VERSION: u32 = 1;
const DB_FILE: &str = "taskmaster.db";

/// Key/value store backed by an SQLite database file
pub struct SqliteStore {
    base_path: PathBuf,
    db: Connection,
}

impl SqliteStore {
    /// Open or create a store in the given directory
    ///
    /// Creates the directory, the database and its schema, a `.gitignore`
    /// for the database files, and a `.version` marker.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        // Create directory if it doesn't exist
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;

        let db_path = base_path.join(DB_FILE);
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let store = Self { base_path, db };
        store.create_schema()?;
        store.create_gitignore()?;
        store.write_version()?;

        info!(db = ?db_path, "Opened SQLite task store");
        Ok(store)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating database schema");

        self.db
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value_json TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
            )
            .context("Failed to create schema")?;

        Ok(())
    }

    fn create_gitignore(&self) -> Result<()> {
        let gitignore_path = self.base_path.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(
                gitignore_path,
                "taskmaster.db\ntaskmaster.db-shm\ntaskmaster.db-wal\n",
            )?;
        }
        Ok(())
    }

    fn write_version(&self) -> Result<()> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(version_path, CURRENT_VERSION.to_string())?;
        }
        Ok(())
    }

    fn read_raw(&self, key: &str) -> rusqlite::Result<Option<String>> {
        self.db
            .query_row("SELECT value_json FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
    }
}

impl Persistence for SqliteStore {
    fn load(&self, key: &str) -> Vec<Task> {
        if let Err(e) = validate_key(key) {
            warn!(key, error = %e, "Refusing to load invalid key");
            return Vec::new();
        }

        match self.read_raw(key) {
            Ok(Some(raw)) => {
                let tasks = parse_tasks("sqlite", key, &raw);
                info!(key, count = tasks.len(), "Loaded tasks from SQLite");
                tasks
            }
            Ok(None) => {
                debug!(key, "No stored tasks, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(key, error = ?e, "Failed to query stored tasks, starting empty");
                Vec::new()
            }
        }
    }

    fn save(&self, key: &str, tasks: &[Task]) -> Result<(), StorageError> {
        validate_key(key)?;

        let json = serde_json::to_string(tasks)?;
        self.db.execute(
            "INSERT OR REPLACE INTO kv (key, value_json, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, json, now_ms()],
        )?;

        debug!(key, count = tasks.len(), "Saved tasks to SQLite");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.base_path.join(DB_FILE).display())
    }
}
