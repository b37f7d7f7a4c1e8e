// Taskmaster - personal task list with local persistence and AI suggestions

pub mod collection;
pub mod config;
pub mod error;
pub mod event;
pub mod persist;
pub mod store;
pub mod suggest;
pub mod task;

// Re-export main types for convenience
pub use config::{Config, StorageConfig, SuggestConfig};
pub use error::{GenerationError, StorageError, TaskError, TaskResult};
pub use event::{EventSink, StoreEvent};
pub use persist::{Backend, JsonFileStore, MemoryStore, Persistence, SqliteStore, open_backend};
pub use store::TaskStore;
pub use suggest::{AnthropicGenerator, SuggestionGenerator, SuggestionSession, SuggestionStatus};
pub use task::{Task, now_ms};
