// Error types for the task list

use std::path::PathBuf;
use thiserror::Error;

/// Result type for task list operations
pub type TaskResult<T> = Result<T, TaskError>;

/// Errors surfaced by store and suggestion operations
///
/// None of these are fatal: the collection is left as it was and the caller
/// decides how to notify the user.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Task text was empty or whitespace-only
    #[error("task text must not be empty")]
    Validation,

    /// No task (or suggestion) with the given identifier
    #[error("task not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("suggestion generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Failures reading or writing persisted tasks
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("failed to acquire lock: {0}")]
    Lock(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures from the suggestion generator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("a topic is required to generate suggestions")]
    EmptyTopic,

    #[error("api key not set in ${0}")]
    MissingApiKey(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("generator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode suggestions: {0}")]
    Decode(String),
}
