//! Synthetic conversation and a slow history source for the demo harness.

use std::time::Duration;

use async_trait::async_trait;
use tideline_core::entry::{RawMessage, Reaction};
use tideline_core::error::Result;
use tideline_core::history::{HistoryPage, HistorySource, StaticHistory};
use tracing::debug;

const DAY_MS: i64 = 86_400_000;
const PARTICIPANTS: [&str; 3] = ["alice", "bob", "carol"];

const LINES: [&str; 8] = [
    "morning!",
    "Did anyone look at the flaky deploy from yesterday? It failed twice on the migration step and then passed without changes.",
    "on it",
    "I think the lock timeout is too low for the large tables. Bumping it to thirty seconds made it pass locally every time, but I'd like a second pair of eyes before we merge.",
    "+1",
    "Lunch?",
    "Pushed a fix, can you review when you get a chance?",
    "Looks good to me. Shipping it after the standup so we can watch the dashboards together.",
];

/// `count` messages ending at `now_ms`, spread over several days. Gaps grow
/// every few messages so day boundaries show up regularly.
pub fn demo_conversation(count: usize, now_ms: i64) -> Vec<RawMessage> {
    let mut timestamp = now_ms;
    let mut messages: Vec<RawMessage> = (0..count)
        .map(|i| {
            let step = if i % 17 == 16 { DAY_MS / 3 } else { 7 * 60_000 };
            timestamp -= step;
            demo_message(i, timestamp)
        })
        .collect();
    messages.reverse();
    messages
}

fn demo_message(i: usize, timestamp: i64) -> RawMessage {
    let user = PARTICIPANTS[(i / 2) % PARTICIPANTS.len()];
    let mut message = RawMessage::new(format!("demo-{i}"), user, timestamp)
        .with_content(LINES[i % LINES.len()]);
    if i % 5 == 0 {
        message.reactions.push(Reaction {
            emoji: "👍".to_string(),
            user_ids: PARTICIPANTS.iter().take(1 + i % 3).map(|u| (*u).to_string()).collect(),
        });
    }
    if i % 11 == 0 {
        message.thread_replies = (i % 4) as u32 + 1;
    }
    message
}

/// History source over a fixed message list that answers after `delay`.
pub struct DemoHistory {
    inner: StaticHistory,
    delay: Duration,
}

impl DemoHistory {
    pub fn new(messages: Vec<RawMessage>, delay: Duration) -> Self {
        Self {
            inner: StaticHistory::new(messages),
            delay,
        }
    }
}

#[async_trait]
impl HistorySource for DemoHistory {
    async fn fetch_before(&self, before_id: Option<String>, limit: usize) -> Result<HistoryPage> {
        tokio::time::sleep(self.delay).await;
        let page = self.inner.fetch_before(before_id, limit).await?;
        debug!(
            target: "tideline::tui::demo",
            count = page.messages.len(),
            has_more = page.has_more,
            "Served demo history page"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_conversation_is_chronological_and_unique() {
        let messages = demo_conversation(60, 10 * DAY_MS);
        assert_eq!(messages.len(), 60);
        assert!(
            messages
                .windows(2)
                .all(|w| w[0].timestamp < w[1].timestamp)
        );
        let ids: std::collections::HashSet<_> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), 60);
    }

    #[tokio::test]
    async fn demo_history_pages_after_delay() {
        let all = demo_conversation(10, 10 * DAY_MS);
        let oldest_loaded = all[6].id.clone();
        let source = DemoHistory::new(all, Duration::from_millis(1));

        let page = source.fetch_before(Some(oldest_loaded), 4).await.unwrap();
        assert_eq!(page.messages.len(), 4);
        assert!(page.has_more);
    }
}
