//! Test utilities for tideline-core
//!
//! Builders shared by unit tests, integration tests and benches.

use std::sync::{Arc, Mutex};

use indexmap::IndexSet;

use crate::callbacks::ViewportCallbacks;
use crate::entry::{MessageEntry, RawMessage};

pub const DAY_MS: i64 = 86_400_000;

/// A message with the given id, sender and epoch-millisecond timestamp.
pub fn message_at(id: &str, user_id: &str, timestamp: i64) -> RawMessage {
    RawMessage::new(id, user_id, timestamp).with_content(format!("message {id}"))
}

/// `count` messages alternating between two senders, one minute apart,
/// starting at `start_ms`.
pub fn conversation(count: usize, start_ms: i64) -> Vec<RawMessage> {
    (0..count)
        .map(|i| {
            let user = if i % 2 == 0 { "alice" } else { "bob" };
            message_at(&format!("msg-{i}"), user, start_ms + (i as i64) * 60_000)
        })
        .collect()
}

/// Callback invocation recorded by [`RecordingCallbacks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEvent {
    RequestOlder,
    Reply(String),
    Select(Vec<String>),
    JumpToBottomVisible(bool),
}

/// Callbacks that record every invocation into a shared log.
#[derive(Debug, Clone, Default)]
pub struct RecordingCallbacks {
    events: Arc<Mutex<Vec<CallbackEvent>>>,
}

impl RecordingCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CallbackEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, predicate: impl Fn(&CallbackEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    fn push(&self, event: CallbackEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event);
    }
}

impl ViewportCallbacks for RecordingCallbacks {
    fn on_request_older_messages(&mut self) {
        self.push(CallbackEvent::RequestOlder);
    }

    fn on_reply(&mut self, entry: &MessageEntry) {
        self.push(CallbackEvent::Reply(entry.id().to_string()));
    }

    fn on_select_entries(&mut self, ids: &IndexSet<String>) {
        self.push(CallbackEvent::Select(ids.iter().cloned().collect()));
    }

    fn on_jump_to_bottom_visibility_change(&mut self, visible: bool) {
        self.push(CallbackEvent::JumpToBottomVisible(visible));
    }
}
