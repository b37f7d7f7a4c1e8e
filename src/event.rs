// Notifications emitted by the store and the suggestion session

use crate::task::Task;
use tokio::sync::mpsc::UnboundedSender;

/// Something presentation may want to tell the user about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    TaskAdded(Task),
    TaskToggled(Task),
    TaskDeleted(Task),
    TasksReordered { dragged_id: String, target_id: String },
    /// `count` is zero when there was nothing to clear
    CompletedCleared { count: usize },
    SuggestionsLoaded { topic: String, count: usize },
    SuggestionsFailed { topic: String, message: String },
    /// A save failed; in-memory state is still authoritative
    StorageFailed { message: String },
}

/// Channel end events are pushed into
pub type EventSink = UnboundedSender<StoreEvent>;

/// Send an event if anyone is listening. A closed receiver is not an error.
pub(crate) fn emit(sink: Option<&EventSink>, event: StoreEvent) {
    if let Some(tx) = sink {
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_emit_delivers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        emit(Some(&tx), StoreEvent::CompletedCleared { count: 2 });
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::CompletedCleared { count: 2 });
    }

    #[test]
    fn test_emit_ignores_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        emit(Some(&tx), StoreEvent::CompletedCleared { count: 0 });
        emit(None, StoreEvent::CompletedCleared { count: 0 });
    }
}
