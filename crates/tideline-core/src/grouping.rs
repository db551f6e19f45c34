//! Groups raw messages by local calendar day and flattens them into the entry
//! sequence the viewport renders.

use chrono::{DateTime, Local, TimeZone};
use indexmap::IndexMap;
use tracing::warn;

use crate::entry::{DateKey, DateSeparatorEntry, Entry, MessageEntry, RawMessage};

/// Flatten `messages` using the viewer's local timezone.
pub fn flatten(messages: &[RawMessage], current_user_id: &str) -> Vec<Entry> {
    flatten_in(messages, current_user_id, &Local)
}

/// Flatten `messages`, truncating timestamps to calendar days in `tz`.
///
/// Groups are emitted in first-appearance order with the `Unknown` bucket
/// last. Each group is preceded by exactly one separator.
pub fn flatten_in<Tz: TimeZone>(
    messages: &[RawMessage],
    current_user_id: &str,
    tz: &Tz,
) -> Vec<Entry> {
    if messages.is_empty() {
        return Vec::new();
    }

    let mut groups: IndexMap<DateKey, Vec<&RawMessage>> = IndexMap::new();
    let mut undated: Vec<&RawMessage> = Vec::new();

    for message in messages {
        match date_key_in(message, tz) {
            DateKey::Unknown => undated.push(message),
            key => groups.entry(key).or_default().push(message),
        }
    }

    if !undated.is_empty() {
        warn!(
            target: "tideline::grouping",
            count = undated.len(),
            "Messages with missing or invalid timestamp/id grouped under unknown date"
        );
        groups.insert(DateKey::Unknown, undated);
    }

    let mut entries = Vec::with_capacity(messages.len() + groups.len());
    for (key, group) in groups {
        entries.push(Entry::Separator(DateSeparatorEntry::new(key)));

        let mut previous_user: Option<&str> = None;
        for message in group {
            let show_avatar = previous_user != Some(message.user_id.as_str());
            entries.push(Entry::Message(MessageEntry {
                message: message.clone(),
                show_avatar,
                is_own_message: message.user_id == current_user_id,
            }));
            previous_user = Some(message.user_id.as_str());
        }
    }

    entries
}

/// Compute the day bucket for a message in `tz`.
pub fn date_key_in<Tz: TimeZone>(message: &RawMessage, tz: &Tz) -> DateKey {
    if message.id.is_empty() {
        return DateKey::Unknown;
    }

    message
        .timestamp
        .and_then(DateTime::from_timestamp_millis)
        .map_or(DateKey::Unknown, |utc| {
            DateKey::Day(utc.with_timezone(tz).date_naive())
        })
}

/// Number of distinct day keys in `messages`, the expected separator count.
pub fn distinct_day_count<Tz: TimeZone>(messages: &[RawMessage], tz: &Tz) -> usize {
    messages
        .iter()
        .map(|message| date_key_in(message, tz))
        .collect::<std::collections::HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{DAY_MS, message_at};
    use chrono::{FixedOffset, NaiveDate, Utc};
    use proptest::prelude::*;

    fn separators(entries: &[Entry]) -> Vec<&str> {
        entries
            .iter()
            .filter(|e| e.is_separator())
            .map(|e| e.id())
            .collect()
    }

    #[test]
    fn empty_input_produces_no_separators() {
        assert!(flatten_in(&[], "me", &Utc).is_empty());
    }

    #[test]
    fn separator_precedes_each_day() {
        let messages = vec![
            message_at("a", "alice", 0),
            message_at("b", "bob", 1_000),
            message_at("c", "alice", DAY_MS),
        ];

        let entries = flatten_in(&messages, "alice", &Utc);
        let ids: Vec<&str> = entries.iter().map(|e| e.id()).collect();
        assert_eq!(
            ids,
            vec!["date-1970-01-01", "a", "b", "date-1970-01-02", "c"]
        );
    }

    #[test]
    fn avatar_shown_on_sender_change_and_group_start() {
        let messages = vec![
            message_at("a", "alice", 0),
            message_at("b", "alice", 10),
            message_at("c", "bob", 20),
            message_at("d", "bob", DAY_MS),
        ];

        let entries = flatten_in(&messages, "alice", &Utc);
        let flags: Vec<(bool, bool)> = entries
            .iter()
            .filter_map(Entry::as_message)
            .map(|m| (m.show_avatar, m.is_own_message))
            .collect();

        // "d" is bob again but opens a new day group, so the avatar returns.
        assert_eq!(
            flags,
            vec![(true, true), (false, true), (true, false), (true, false)]
        );
    }

    #[test]
    fn days_follow_local_offset_not_utc() {
        // 23:30 UTC on Jan 1 is already Jan 2 at UTC+1.
        let late = 23 * 3_600_000 + 30 * 60_000;
        let messages = vec![message_at("a", "alice", 0), message_at("b", "alice", late)];

        let utc_entries = flatten_in(&messages, "me", &Utc);
        assert_eq!(separators(&utc_entries), vec!["date-1970-01-01"]);

        let plus_one = FixedOffset::east_opt(3_600).unwrap();
        let local_entries = flatten_in(&messages, "me", &plus_one);
        assert_eq!(
            separators(&local_entries),
            vec!["date-1970-01-01", "date-1970-01-02"]
        );
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        let messages = vec![
            message_at("a", "alice", DAY_MS),
            message_at("b", "alice", 0),
            message_at("c", "alice", DAY_MS + 5),
        ];

        let entries = flatten_in(&messages, "me", &Utc);
        let ids: Vec<&str> = entries.iter().map(|e| e.id()).collect();
        assert_eq!(
            ids,
            vec!["date-1970-01-02", "a", "c", "date-1970-01-01", "b"]
        );
    }

    #[test]
    fn malformed_messages_land_in_trailing_unknown_bucket() {
        let mut missing = message_at("x", "alice", 0);
        missing.timestamp = None;
        let mut no_id = message_at("", "bob", 0);
        no_id.timestamp = Some(5);
        let out_of_range = message_at("y", "carol", i64::MAX);

        let messages = vec![missing, message_at("a", "alice", 0), no_id, out_of_range];
        let entries = flatten_in(&messages, "me", &Utc);
        let ids: Vec<&str> = entries.iter().map(|e| e.id()).collect();

        assert_eq!(ids, vec!["date-1970-01-01", "a", "date-unknown", "x", "", "y"]);
        let Entry::Separator(unknown) = &entries[2] else {
            unreachable!("expected separator");
        };
        assert_eq!(unknown.date_key, DateKey::Unknown);
        assert_eq!(unknown.date, None);
    }

    #[test]
    fn separator_carries_its_date() {
        let entries = flatten_in(&[message_at("a", "alice", DAY_MS * 3)], "me", &Utc);
        let Entry::Separator(separator) = &entries[0] else {
            unreachable!("expected separator");
        };
        assert_eq!(separator.date, NaiveDate::from_ymd_opt(1970, 1, 4));
    }

    #[test]
    fn flatten_is_deterministic() {
        let messages: Vec<RawMessage> = (0..20)
            .map(|i| {
                let user = if i % 3 == 0 { "a" } else { "b" };
                message_at(&format!("m{i}"), user, i * DAY_MS / 4)
            })
            .collect();

        assert_eq!(
            flatten_in(&messages, "a", &Utc),
            flatten_in(&messages, "a", &Utc)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_separator_count_matches_distinct_days(
            stamps in proptest::collection::vec(proptest::option::of(0i64..(40 * DAY_MS)), 0..60),
        ) {
            let messages: Vec<RawMessage> = stamps
                .iter()
                .enumerate()
                .map(|(i, ts)| {
                    let mut m = message_at(&format!("m{i}"), "u", 0);
                    m.timestamp = *ts;
                    m
                })
                .collect();

            let entries = flatten_in(&messages, "u", &Utc);
            let separator_count = entries.iter().filter(|e| e.is_separator()).count();
            prop_assert_eq!(separator_count, distinct_day_count(&messages, &Utc));
            prop_assert_eq!(entries.len(), messages.len() + separator_count);
        }

        #[test]
        fn prop_separator_immediately_precedes_its_day(
            stamps in proptest::collection::vec(0i64..(10 * DAY_MS), 1..40),
        ) {
            let messages: Vec<RawMessage> = stamps
                .iter()
                .enumerate()
                .map(|(i, ts)| message_at(&format!("m{i}"), "u", *ts))
                .collect();

            let entries = flatten_in(&messages, "u", &Utc);
            let mut current: Option<DateKey> = None;
            for entry in &entries {
                match entry {
                    Entry::Separator(separator) => current = Some(separator.date_key),
                    Entry::Message(message) => {
                        prop_assert_eq!(Some(date_key_in(&message.message, &Utc)), current);
                    }
                }
            }
        }
    }
}
