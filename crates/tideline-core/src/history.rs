//! Fetching older history off the UI task.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::entry::RawMessage;
use crate::error::Result;
use crate::pagination::HistoryTicket;

/// One page of older messages, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPage {
    pub messages: Vec<RawMessage>,
    pub has_more: bool,
}

/// Anything that can produce messages older than a given id.
#[async_trait]
pub trait HistorySource: Send + Sync + 'static {
    /// Fetch up to `limit` messages strictly older than `before_id`, or the
    /// newest page when `before_id` is `None`. An id the source does not know
    /// yields an empty page with `has_more == false`.
    async fn fetch_before(&self, before_id: Option<String>, limit: usize) -> Result<HistoryPage>;
}

/// Result of a fetch, tagged with the ticket it was issued under.
#[derive(Debug)]
pub struct HistoryResponse {
    pub ticket: HistoryTicket,
    pub result: Result<HistoryPage>,
}

/// Runs fetches on the tokio runtime and delivers responses over a channel,
/// so the receiving loop applies them on its own task.
pub struct HistoryLoader {
    source: Arc<dyn HistorySource>,
    page_size: usize,
    tx: mpsc::UnboundedSender<HistoryResponse>,
}

impl HistoryLoader {
    pub fn new(
        source: Arc<dyn HistorySource>,
        page_size: usize,
    ) -> (Self, mpsc::UnboundedReceiver<HistoryResponse>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                source,
                page_size,
                tx,
            },
            rx,
        )
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Spawn a fetch for messages older than `before_id`.
    pub fn request(&self, ticket: HistoryTicket, before_id: Option<String>) -> JoinHandle<()> {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let limit = self.page_size;

        tokio::spawn(async move {
            debug!(
                target: "tideline::history",
                epoch = ticket.epoch(),
                before = ?before_id,
                limit,
                "Fetching history"
            );
            let result = source.fetch_before(before_id, limit).await;
            if let Err(e) = &result {
                warn!(target: "tideline::history", error = %e, "History fetch failed");
            }
            if tx.send(HistoryResponse { ticket, result }).is_err() {
                debug!(target: "tideline::history", "History receiver dropped");
            }
        })
    }
}

/// In-memory source over a fixed, oldest-first message list. The list must
/// include the messages already shown, since paging starts from their ids.
#[derive(Debug, Clone, Default)]
pub struct StaticHistory {
    messages: Vec<RawMessage>,
}

impl StaticHistory {
    pub fn new(messages: Vec<RawMessage>) -> Self {
        Self { messages }
    }
}

#[async_trait]
impl HistorySource for StaticHistory {
    async fn fetch_before(&self, before_id: Option<String>, limit: usize) -> Result<HistoryPage> {
        let end = match before_id {
            Some(id) => match self.messages.iter().position(|m| m.id == id) {
                Some(index) => index,
                None => {
                    warn!(target: "tideline::history", before = %id, "Unknown history anchor");
                    return Ok(HistoryPage::default());
                }
            },
            None => self.messages.len(),
        };
        let start = end.saturating_sub(limit);
        Ok(HistoryPage {
            messages: self.messages[start..end].to_vec(),
            has_more: start > 0,
        })
    }
}
