// Task entity for the task list

use serde::{Deserialize, Serialize};

/// A single to-do item
///
/// Serialized as `{id, text, completed, createdAt}` with `createdAt` in
/// milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub created_at: i64,
}

impl Task {
    /// Build a fresh, active task. Callers are responsible for passing
    /// already-trimmed, non-empty text.
    pub fn new(id: impl Into<String>, text: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            completed: false,
            created_at,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.completed
    }
}

/// Generate a new task identifier (UUID v7, time ordered)
pub fn new_task_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        assert!(ts > 0);
        // Should be reasonable timestamp (after year 2020)
        assert!(ts > 1_600_000_000_000);
    }

    #[test]
    fn test_new_task_is_active() {
        let task = Task::new("t1", "Buy milk", 1000);
        assert!(task.is_active());
        assert!(!task.completed);
        assert_eq!(task.created_at, 1000);
    }

    #[test]
    fn test_task_ids_are_distinct() {
        let a = new_task_id();
        let b = new_task_id();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_task_wire_format() {
        let task = Task::new("t1", "Buy milk", 1_700_000_000_000);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "t1",
                "text": "Buy milk",
                "completed": false,
                "createdAt": 1_700_000_000_000i64,
            })
        );
    }

    #[test]
    fn test_task_parses_stored_array() {
        let raw = r#"[{"id":"a","text":"A","completed":true,"createdAt":5}]"#;
        let tasks: Vec<Task> = serde_json::from_str(raw).unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].completed);
        assert_eq!(tasks[0].created_at, 5);
    }
}
