// AI task suggestions: generator contract and the transient suggestion list

mod anthropic;

pub use anthropic::{AnthropicGenerator, parse_suggestions};

use crate::error::{GenerationError, TaskError, TaskResult};
use crate::event::{EventSink, StoreEvent, emit};
use crate::store::TaskStore;
use crate::task::Task;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Turns a free-text topic into candidate task descriptions
#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    /// Generate suggestions for a non-empty topic. An empty list is a valid
    /// answer.
    async fn generate(&self, topic: &str) -> Result<Vec<String>, GenerationError>;
}

/// Where the current suggestion request stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SuggestionStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Holds the suggestions from the last request until they are accepted or
/// dismissed. Nothing here is persisted.
pub struct SuggestionSession<G> {
    generator: G,
    suggestions: Vec<String>,
    status: SuggestionStatus,
    events: Option<EventSink>,
}

impl<G: SuggestionGenerator> SuggestionSession<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            suggestions: Vec::new(),
            status: SuggestionStatus::Idle,
            events: None,
        }
    }

    pub fn with_events(mut self, sink: EventSink) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn status(&self) -> &SuggestionStatus {
        &self.status
    }

    /// Ask the generator for suggestions about `topic`, replacing the
    /// current list
    ///
    /// A blank topic fails before the generator is contacted. On failure the
    /// list is left empty.
    pub async fn request_suggestions(&mut self, topic: &str) -> TaskResult<Vec<String>> {
        let topic = topic.trim();
        if topic.is_empty() {
            self.fail(topic, &GenerationError::EmptyTopic);
            return Err(GenerationError::EmptyTopic.into());
        }

        self.suggestions.clear();
        self.status = SuggestionStatus::Loading;
        debug!(topic, "Requesting suggestions");

        match self.generator.generate(topic).await {
            Ok(raw) => {
                self.suggestions = raw
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                self.status = SuggestionStatus::Ready;
                emit(
                    self.events.as_ref(),
                    StoreEvent::SuggestionsLoaded {
                        topic: topic.to_string(),
                        count: self.suggestions.len(),
                    },
                );
                Ok(self.suggestions.clone())
            }
            Err(e) => {
                warn!(topic, error = %e, "Suggestion request failed");
                self.fail(topic, &e);
                Err(e.into())
            }
        }
    }

    /// Add `text` as a task and consume one matching suggestion
    ///
    /// The first occurrence is removed from the list. Accepting text that is
    /// no longer (or never was) listed still adds a task.
    pub fn accept_suggestion(&mut self, text: &str, store: &mut TaskStore) -> TaskResult<Task> {
        let task = store.add(text)?;
        if let Some(index) = self.suggestions.iter().position(|s| s == text) {
            self.suggestions.remove(index);
        }
        Ok(task)
    }

    /// Accept the suggestion at `index` in the current list
    pub fn accept_at(&mut self, index: usize, store: &mut TaskStore) -> TaskResult<Task> {
        let text = self
            .suggestions
            .get(index)
            .cloned()
            .ok_or_else(|| TaskError::NotFound(format!("suggestion #{}", index + 1)))?;
        self.accept_suggestion(&text, store)
    }

    /// Forget the current suggestions
    pub fn dismiss(&mut self) {
        self.suggestions.clear();
        self.status = SuggestionStatus::Idle;
    }

    fn fail(&mut self, topic: &str, err: &GenerationError) {
        self.suggestions.clear();
        self.status = SuggestionStatus::Failed(err.to_string());
        emit(
            self.events.as_ref(),
            StoreEvent::SuggestionsFailed {
                topic: topic.to_string(),
                message: err.to_string(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    /// Generator returning a canned answer and counting calls
    #[derive(Clone)]
    struct FakeGenerator {
        answer: Result<Vec<String>, GenerationError>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeGenerator {
        fn ok(items: &[&str]) -> Self {
            Self {
                answer: Ok(items.iter().map(|s| s.to_string()).collect()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing() -> Self {
            Self {
                answer: Err(GenerationError::Request("connection reset".to_string())),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl SuggestionGenerator for FakeGenerator {
        async fn generate(&self, _topic: &str) -> Result<Vec<String>, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    fn open_store() -> (TaskStore, MemoryStore) {
        let backend = MemoryStore::new();
        (TaskStore::open(Box::new(backend.clone()), "tasks"), backend)
    }

    #[tokio::test]
    async fn test_empty_topic_skips_generator() {
        let generator = FakeGenerator::ok(&["Anything"]);
        let calls = generator.calls.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = SuggestionSession::new(generator).with_events(tx);

        let err = session.request_suggestions("   ").await.unwrap_err();
        assert!(matches!(err, TaskError::Generation(GenerationError::EmptyTopic)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(matches!(rx.try_recv().unwrap(), StoreEvent::SuggestionsFailed { .. }));
    }

    #[tokio::test]
    async fn test_request_loads_trimmed_suggestions() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session =
            SuggestionSession::new(FakeGenerator::ok(&[" Book venue ", "", "Send invites"])).with_events(tx);

        let loaded = session.request_suggestions("Plan a party").await.unwrap();
        assert_eq!(loaded, vec!["Book venue", "Send invites"]);
        assert_eq!(session.suggestions(), loaded.as_slice());
        assert_eq!(session.status(), &SuggestionStatus::Ready);
        assert_eq!(
            rx.try_recv().unwrap(),
            StoreEvent::SuggestionsLoaded {
                topic: "Plan a party".to_string(),
                count: 2
            }
        );
    }

    #[tokio::test]
    async fn test_empty_answer_is_not_an_error() {
        let mut session = SuggestionSession::new(FakeGenerator::ok(&[]));
        let loaded = session.request_suggestions("Nothing to do").await.unwrap();
        assert!(loaded.is_empty());
        assert_eq!(session.status(), &SuggestionStatus::Ready);
    }

    #[tokio::test]
    async fn test_generator_failure_leaves_tasks_alone() {
        let (mut store, backend) = open_store();
        store.add("Existing").unwrap();
        let before = store.tasks().to_vec();
        let saves = backend.save_count();

        let mut session = SuggestionSession::new(FakeGenerator::failing());
        let err = session.request_suggestions("Learn Rust").await.unwrap_err();

        assert!(matches!(err, TaskError::Generation(GenerationError::Request(_))));
        assert!(session.suggestions().is_empty());
        assert!(matches!(session.status(), SuggestionStatus::Failed(_)));
        assert_eq!(store.tasks(), before.as_slice());
        assert_eq!(backend.save_count(), saves);
    }

    #[tokio::test]
    async fn test_accept_consumes_one_occurrence() {
        let (mut store, _) = open_store();
        let mut session = SuggestionSession::new(FakeGenerator::ok(&["Buy cake", "Buy cake", "Call Sam"]));
        session.request_suggestions("Party").await.unwrap();

        let task = session.accept_suggestion("Buy cake", &mut store).unwrap();
        assert_eq!(task.text, "Buy cake");
        assert_eq!(session.suggestions(), &["Buy cake".to_string(), "Call Sam".to_string()]);

        session.accept_suggestion("Buy cake", &mut store).unwrap();
        assert_eq!(session.suggestions(), &["Call Sam".to_string()]);

        // Accepting again after it's gone still produces an independent task
        session.accept_suggestion("Buy cake", &mut store).unwrap();
        let ids: Vec<&str> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(store.len(), 3);
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
    }

    #[tokio::test]
    async fn test_accept_at_index() {
        let (mut store, _) = open_store();
        let mut session = SuggestionSession::new(FakeGenerator::ok(&["One", "Two"]));
        session.request_suggestions("Numbers").await.unwrap();

        let task = session.accept_at(1, &mut store).unwrap();
        assert_eq!(task.text, "Two");
        assert_eq!(session.suggestions(), &["One".to_string()]);

        assert!(matches!(session.accept_at(5, &mut store), Err(TaskError::NotFound(_))));
    }

    #[test]
    fn test_accept_blank_keeps_list() {
        let (mut store, _) = open_store();
        let mut session = SuggestionSession::new(FakeGenerator::ok(&[]));
        session.suggestions = vec!["  ".to_string()];

        assert!(matches!(session.accept_suggestion("  ", &mut store), Err(TaskError::Validation)));
        assert_eq!(session.suggestions().len(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_new_request_replaces_list_and_dismiss_clears() {
        let mut session = SuggestionSession::new(FakeGenerator::ok(&["A"]));
        session.request_suggestions("first").await.unwrap();
        session.request_suggestions("second").await.unwrap();
        assert_eq!(session.suggestions().len(), 1);

        session.dismiss();
        assert!(session.suggestions().is_empty());
        assert_eq!(session.status(), &SuggestionStatus::Idle);
    }
}
