//! Renderable units of a message list: messages and synthetic date separators.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::IntoStaticStr;

/// A chat message as supplied by the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub id: String,
    pub user_id: String,
    /// Milliseconds since the Unix epoch. `None` when the source omitted it.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub thread_replies: u32,
    #[serde(default)]
    pub read_by: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub emoji: String,
    #[serde(default)]
    pub user_ids: Vec<String>,
}

impl RawMessage {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            timestamp: Some(timestamp),
            content: String::new(),
            reactions: Vec::new(),
            thread_replies: 0,
            read_by: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// Calendar-day bucket a message is grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DateKey {
    Day(NaiveDate),
    /// Sentinel for messages whose timestamp or id is unusable.
    Unknown,
}

impl DateKey {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DateKey::Day(date) => Some(*date),
            DateKey::Unknown => None,
        }
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateKey::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            DateKey::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSeparatorEntry {
    pub id: String,
    pub date_key: DateKey,
    pub date: Option<NaiveDate>,
}

impl DateSeparatorEntry {
    pub fn new(date_key: DateKey) -> Self {
        Self {
            id: format!("date-{date_key}"),
            date_key,
            date: date_key.date(),
        }
    }

    /// Human readable label, e.g. "Tue, 5 Mar 2024".
    pub fn label(&self) -> String {
        match self.date {
            Some(date) => date.format("%a, %-d %b %Y").to_string(),
            None => "Unknown date".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    pub message: RawMessage,
    pub show_avatar: bool,
    pub is_own_message: bool,
}

impl MessageEntry {
    pub fn id(&self) -> &str {
        &self.message.id
    }

    pub fn user_id(&self) -> &str {
        &self.message.user_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum EntryKind {
    Separator,
    Message,
}

/// One row of the flattened sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Separator(DateSeparatorEntry),
    Message(MessageEntry),
}

impl Entry {
    pub fn id(&self) -> &str {
        match self {
            Entry::Separator(separator) => &separator.id,
            Entry::Message(message) => message.id(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Separator(_) => EntryKind::Separator,
            Entry::Message(_) => EntryKind::Message,
        }
    }

    pub fn as_message(&self) -> Option<&MessageEntry> {
        match self {
            Entry::Message(message) => Some(message),
            Entry::Separator(_) => None,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Entry::Separator(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_id_uses_date_key() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let separator = DateSeparatorEntry::new(DateKey::Day(date));
        assert_eq!(separator.id, "date-2024-03-05");
        assert_eq!(separator.label(), "Tue, 5 Mar 2024");

        let unknown = DateSeparatorEntry::new(DateKey::Unknown);
        assert_eq!(unknown.id, "date-unknown");
        assert_eq!(unknown.date, None);
    }

    #[test]
    fn raw_message_reads_camel_case_json() {
        let json = r#"{"id":"m1","userId":"alice","timestamp":1700000000000,"content":"hi","readBy":["bob"]}"#;
        let message: RawMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.user_id, "alice");
        assert_eq!(message.timestamp, Some(1_700_000_000_000));
        assert_eq!(message.read_by, vec!["bob".to_string()]);
        assert_eq!(message.thread_replies, 0);
    }

    #[test]
    fn raw_message_without_timestamp_deserializes() {
        let message: RawMessage = serde_json::from_str(r#"{"id":"m1","userId":"a"}"#).unwrap();
        assert_eq!(message.timestamp, None);
    }

    #[test]
    fn entry_kind_names() {
        let separator: &'static str = Entry::Separator(DateSeparatorEntry::new(DateKey::Unknown))
            .kind()
            .into();
        assert_eq!(separator, "separator");
        let message: &'static str = EntryKind::Message.into();
        assert_eq!(message, "message");
    }
}
