//! MessageViewport - owns the flattened sequence, its height cache and all
//! scroll/gesture state for one conversation.

use chrono::{FixedOffset, Local};
use tracing::{debug, info};

use crate::callbacks::{NoopCallbacks, ViewportCallbacks};
use crate::config::{Pixels, TidelineConfig, ViewportConfig};
use crate::entry::{Entry, RawMessage};
use crate::error::Result;
use crate::gesture::{Displacement, GestureClassifier, GestureIntent, TouchSample};
use crate::grouping::flatten_in;
use crate::height::HeightModel;
use crate::pagination::{HistoryTicket, PaginationState};
use crate::scroll::{ArrivalAction, ScrollController, ScrollTarget};
use crate::selection::SelectionState;
use crate::window::{RenderSlice, WindowCalculator, WindowRange};

/// Position of the first visible message, used to keep the reader in place
/// when history is prepended.
struct Anchor {
    id: String,
    /// Scroll offset minus the entry's top edge; negative when a separator
    /// above the entry is still in view.
    delta: i64,
}

pub struct MessageViewport {
    config: ViewportConfig,
    current_user_id: String,
    /// Day boundaries follow this offset instead of the local timezone.
    day_offset: Option<FixedOffset>,
    messages: Vec<RawMessage>,
    entries: Vec<Entry>,
    heights: HeightModel,
    calculator: WindowCalculator,
    scroll: ScrollController,
    pagination: PaginationState,
    gestures: GestureClassifier,
    selection: SelectionState,
    last_window: Option<WindowRange>,
    scroll_top: Pixels,
    viewport_height: Pixels,
    scroll_target: Option<ScrollTarget>,
    /// Request issued by the last scroll that the host has not picked up.
    requested: Option<HistoryTicket>,
    callbacks: Box<dyn ViewportCallbacks>,
}

impl std::fmt::Debug for MessageViewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageViewport")
            .field("entries", &self.entries.len())
            .field("scroll_top", &self.scroll_top)
            .field("viewport_height", &self.viewport_height)
            .field("last_window", &self.last_window)
            .finish_non_exhaustive()
    }
}

impl MessageViewport {
    pub fn new(current_user_id: impl Into<String>, config: &TidelineConfig) -> Self {
        let viewport = config.viewport;
        Self {
            config: viewport,
            current_user_id: current_user_id.into(),
            day_offset: None,
            messages: Vec::new(),
            entries: Vec::new(),
            heights: HeightModel::new(viewport.estimate_height),
            calculator: WindowCalculator::from_config(&viewport),
            scroll: ScrollController::new(viewport.at_bottom_epsilon),
            pagination: PaginationState::new(false),
            gestures: GestureClassifier::new(config.gestures),
            selection: SelectionState::new(),
            last_window: None,
            scroll_top: 0,
            viewport_height: 0,
            scroll_target: None,
            requested: None,
            callbacks: Box::new(NoopCallbacks),
        }
    }

    pub fn with_callbacks(mut self, callbacks: Box<dyn ViewportCallbacks>) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Group days by a fixed UTC offset instead of the local timezone.
    pub fn with_day_offset(mut self, offset: FixedOffset) -> Self {
        self.day_offset = Some(offset);
        self
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn messages(&self) -> &[RawMessage] {
        &self.messages
    }

    pub fn heights(&self) -> &HeightModel {
        &self.heights
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn scroll_top(&self) -> Pixels {
        self.scroll_top
    }

    pub fn viewport_height(&self) -> Pixels {
        self.viewport_height
    }

    pub fn content_height(&self) -> Pixels {
        self.heights.total_height()
    }

    pub fn max_scroll(&self) -> Pixels {
        self.content_height().saturating_sub(self.viewport_height)
    }

    pub fn jump_to_bottom_visible(&self) -> bool {
        self.scroll.jump_visible()
    }

    /// Messages that arrived while the reader was scrolled up.
    pub fn unseen_count(&self) -> usize {
        self.scroll.unseen()
    }

    pub fn is_tracking_gesture(&self) -> bool {
        self.gestures.is_tracking()
    }

    pub fn oldest_message_id(&self) -> Option<&str> {
        self.messages.first().map(|m| m.id.as_str())
    }

    /// Replace the message list of the current conversation (new arrivals,
    /// edits, deletions).
    pub fn set_messages(&mut self, messages: Vec<RawMessage>) {
        self.messages = messages;
        self.regroup();

        let was_visible = self.scroll.jump_visible();
        match self.scroll.on_count_changed(self.messages.len()) {
            ArrivalAction::FollowToBottom => {
                self.scroll_target = Some(ScrollTarget::Bottom);
            }
            ArrivalAction::ShowJumpToBottom { unseen } => {
                debug!(target: "tideline::viewport", unseen, "New messages while reading history");
                if !was_visible {
                    self.callbacks.on_jump_to_bottom_visibility_change(true);
                }
            }
            ArrivalAction::None => {}
        }
    }

    /// Switch to a different conversation. Measurements, selection and any
    /// in-flight history request are discarded.
    pub fn replace_conversation(&mut self, messages: Vec<RawMessage>, has_more: bool) {
        info!(
            target: "tideline::viewport",
            count = messages.len(),
            has_more,
            "Replacing conversation"
        );
        let was_visible = self.scroll.jump_visible();

        self.pagination.reset(has_more);
        self.requested = None;
        self.heights.reset();
        self.selection.clear();
        self.gestures.cancel();

        self.messages = messages;
        self.entries = self.flatten();
        self.heights.resize(self.entries.len());
        self.scroll.reset(self.messages.len());
        self.scroll_top = 0;
        self.scroll_target = Some(ScrollTarget::Bottom);
        self.last_window = None;

        if was_visible {
            self.callbacks.on_jump_to_bottom_visibility_change(false);
        }
    }

    pub fn set_has_more_history(&mut self, has_more: bool) {
        self.pagination.set_has_more(has_more);
    }

    pub fn set_viewport_height(&mut self, height: Pixels) {
        if height == self.viewport_height {
            return;
        }
        self.viewport_height = height;
        if self.scroll.was_at_bottom() {
            self.scroll_target = Some(ScrollTarget::Bottom);
        } else {
            self.scroll_top = self.scroll_top.min(self.max_scroll());
            self.observe_scroll();
        }
    }

    /// Record a measured height reported by the view layer.
    ///
    /// While following the bottom the list stays pinned; otherwise entries
    /// measured above the viewport shift the scroll offset so the visible
    /// content does not jump.
    pub fn set_measured(&mut self, index: usize, height: Pixels) -> Result<()> {
        let previous = self.heights.height(index)?;
        self.heights.set_measured(index, height)?;
        if previous == height {
            return Ok(());
        }

        if self.scroll.was_at_bottom() {
            if self.scroll_target.is_none() {
                self.scroll_target = Some(ScrollTarget::Bottom);
            }
        } else if self.heights.cumulative_offset(0, index)?.saturating_add(previous)
            <= self.scroll_top
        {
            self.scroll_top = if height > previous {
                self.scroll_top.saturating_add(height - previous)
            } else {
                self.scroll_top.saturating_sub(previous - height)
            };
        }
        Ok(())
    }

    /// Forget every measurement, e.g. after the layout width changed. A
    /// follow-to-bottom position is kept pinned.
    pub fn invalidate_heights(&mut self) {
        self.heights.invalidate_from(0);
        if self.scroll.was_at_bottom() {
            self.scroll_target = Some(ScrollTarget::Bottom);
        }
    }

    /// Handle a scroll to `scroll_top`. Returns the ticket of a newly issued
    /// history request, if any.
    pub fn on_scroll(&mut self, scroll_top: Pixels) -> Option<HistoryTicket> {
        self.scroll_top = scroll_top;
        self.observe_scroll();

        if !self
            .pagination
            .should_request(scroll_top, self.config.pagination_threshold)
        {
            return None;
        }
        let ticket = self.pagination.begin()?;
        debug!(
            target: "tideline::viewport",
            epoch = ticket.epoch(),
            "Requesting older messages"
        );
        self.requested = Some(ticket);
        self.callbacks.on_request_older_messages();
        Some(ticket)
    }

    /// Scroll by a signed amount, clamped to the content.
    pub fn scroll_by(&mut self, delta: i64) -> Option<HistoryTicket> {
        let target = (i64::from(self.scroll_top) + delta).clamp(0, i64::from(self.max_scroll()));
        self.on_scroll(target as Pixels)
    }

    /// History request issued by a scroll that the host has not taken yet.
    pub fn take_history_request(&mut self) -> Option<HistoryTicket> {
        self.requested.take()
    }

    /// Start a history load explicitly (e.g. to fill a short viewport).
    pub fn begin_history_load(&mut self) -> Option<HistoryTicket> {
        self.pagination.begin()
    }

    /// Prepend a page of older messages. Returns `false` when the ticket is
    /// stale, in which case nothing is touched.
    pub fn apply_history(
        &mut self,
        ticket: HistoryTicket,
        older: Vec<RawMessage>,
        has_more: bool,
    ) -> Result<bool> {
        if !self.pagination.settle(ticket) {
            return Ok(false);
        }
        self.pagination.set_has_more(has_more);
        if older.is_empty() {
            return Ok(true);
        }

        let anchor = self.anchor()?;
        let known: std::collections::HashSet<&str> =
            self.messages.iter().map(|m| m.id.as_str()).collect();
        let mut merged: Vec<RawMessage> = older
            .into_iter()
            .filter(|m| !known.contains(m.id.as_str()))
            .collect();
        let inserted = merged.len();
        merged.append(&mut self.messages);
        self.messages = merged;

        // Only the head of the sequence changes on prepend; keep the
        // measurements of the unchanged tail.
        let entries = self.flatten();
        let unchanged = self
            .entries
            .iter()
            .rev()
            .zip(entries.iter().rev())
            .take_while(|(old, new)| old == new)
            .count();
        self.heights
            .splice_front(self.entries.len() - unchanged, entries.len() - unchanged);
        self.install_entries(entries);
        self.scroll.sync_count(self.messages.len());

        if let Some(anchor) = anchor
            && let Some(index) = self.entries.iter().position(|e| e.id() == anchor.id)
        {
            let top = i64::from(self.heights.cumulative_offset(0, index)?);
            let offset = (top + anchor.delta).clamp(0, i64::from(Pixels::MAX));
            self.scroll_target = Some(ScrollTarget::Offset(offset as Pixels));
        }

        debug!(target: "tideline::viewport", inserted, has_more, "Applied history page");
        Ok(true)
    }

    /// The history request failed; allow a retry.
    pub fn fail_history(&mut self, ticket: HistoryTicket) -> bool {
        self.pagination.settle(ticket)
    }

    pub fn scroll_to_entry(&mut self, index: usize) {
        self.scroll_target = Some(ScrollTarget::Entry(index));
    }

    pub fn jump_to_bottom(&mut self) {
        self.scroll_target = Some(ScrollTarget::Bottom);
        if let Some(visible) = self.scroll.jump_to_bottom() {
            self.callbacks.on_jump_to_bottom_visibility_change(visible);
        }
    }

    /// Resolve a pending scroll target into a concrete offset and scroll
    /// there. Returns the new offset when a target was pending.
    pub fn resolve_scroll_target(&mut self) -> Result<Option<Pixels>> {
        let Some(target) = self.scroll_target.take() else {
            return Ok(None);
        };

        let max = self.max_scroll();
        let offset = match target {
            ScrollTarget::Bottom => max,
            ScrollTarget::Offset(offset) => offset.min(max),
            ScrollTarget::Entry(index) => {
                let index = index.min(self.entries.len());
                self.heights.cumulative_offset(0, index)?.min(max)
            }
        };
        self.on_scroll(offset);
        Ok(Some(offset))
    }

    /// Current window; pure with respect to viewport state.
    pub fn window(&self) -> Result<WindowRange> {
        self.calculator.compute_window(
            &self.heights,
            self.scroll_top,
            self.viewport_height,
            self.entries.len(),
        )
    }

    /// Recompute the window and return it only if it differs from the last
    /// one returned.
    pub fn refresh_window(&mut self) -> Result<Option<WindowRange>> {
        let window = self.window()?;
        if self.last_window == Some(window) {
            return Ok(None);
        }
        self.last_window = Some(window);
        Ok(Some(window))
    }

    pub fn render_slice(&self) -> Result<RenderSlice<'_>> {
        RenderSlice::build(&self.entries, &self.heights, self.window()?)
    }

    /// Begin a touch on the entry at `index`. Separators are not targets.
    pub fn touch_start(&mut self, index: usize, x: f64, y: f64, timestamp_ms: u64) -> bool {
        let Some(Entry::Message(message)) = self.entries.get(index) else {
            return false;
        };
        self.gestures
            .touch_start(TouchSample::new(message.id(), x, y, timestamp_ms));
        true
    }

    pub fn touch_move(&mut self, x: f64, y: f64, timestamp_ms: u64) -> Option<Displacement> {
        self.gestures.touch_move(x, y, timestamp_ms)
    }

    /// Finish the touch sequence and apply the classified intent.
    pub fn touch_end(&mut self, x: f64, y: f64, timestamp_ms: u64) -> GestureIntent {
        let intent = self.gestures.touch_end(x, y, timestamp_ms);
        match &intent {
            GestureIntent::SwipeReply { entry_id } => {
                if let Some(message) = self
                    .entries
                    .iter()
                    .filter_map(Entry::as_message)
                    .find(|m| m.id() == entry_id)
                {
                    self.callbacks.on_reply(message);
                }
            }
            GestureIntent::SwipeRevealActions { entry_id }
            | GestureIntent::LongPressSelect { entry_id } => {
                self.selection.select(entry_id.as_str());
                self.callbacks.on_select_entries(self.selection.ids());
            }
            GestureIntent::None => {}
        }
        intent
    }

    pub fn cancel_touch(&mut self) {
        self.gestures.cancel();
    }

    /// Toggle an entry while in selection mode (e.g. on tap).
    pub fn toggle_selection(&mut self, id: &str) -> bool {
        let selected = self.selection.toggle(id);
        self.callbacks.on_select_entries(self.selection.ids());
        selected
    }

    pub fn clear_selection(&mut self) {
        if self.selection.is_empty() && !self.selection.is_active() {
            return;
        }
        self.selection.clear();
        self.callbacks.on_select_entries(self.selection.ids());
    }

    fn flatten(&self) -> Vec<Entry> {
        match &self.day_offset {
            Some(offset) => flatten_in(&self.messages, &self.current_user_id, offset),
            None => flatten_in(&self.messages, &self.current_user_id, &Local),
        }
    }

    /// Rebuild entries from `self.messages` and drop heights from the first
    /// entry that changed.
    fn regroup(&mut self) {
        let entries = self.flatten();
        let first_changed = self
            .entries
            .iter()
            .zip(&entries)
            .position(|(old, new)| old != new)
            .unwrap_or_else(|| self.entries.len().min(entries.len()));

        self.heights.invalidate_from(first_changed);
        self.heights.resize(entries.len());
        debug!(
            target: "tideline::viewport",
            entries = entries.len(),
            first_changed,
            "Regrouped entries"
        );
        self.install_entries(entries);
    }

    /// Swap in a rebuilt sequence whose heights are already reconciled.
    fn install_entries(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
        self.last_window = None;

        self.selection.retain_existing(
            self.entries
                .iter()
                .filter_map(Entry::as_message)
                .map(|m| m.id()),
        );
        if let Some(tracked) = self.gestures.tracked_entry()
            && !self.entries.iter().any(|e| e.id() == tracked)
        {
            self.gestures.cancel();
        }
    }

    fn observe_scroll(&mut self) {
        // Short content still fills the viewport.
        let content = self.content_height().max(self.viewport_height);
        if let Some(visible) =
            self.scroll
                .observe_scroll(self.scroll_top, self.viewport_height, content)
        {
            self.callbacks.on_jump_to_bottom_visibility_change(visible);
        }
    }

    /// First message entry intersecting the viewport, with the distance from
    /// its top edge to the scroll offset.
    fn anchor(&self) -> Result<Option<Anchor>> {
        let mut top: Pixels = 0;
        for (index, entry) in self.entries.iter().enumerate() {
            let height = self.heights.height(index)?;
            let bottom = top.saturating_add(height);
            if bottom > self.scroll_top
                && let Entry::Message(message) = entry
            {
                return Ok(Some(Anchor {
                    id: message.id().to_string(),
                    delta: i64::from(self.scroll_top) - i64::from(top),
                }));
            }
            top = bottom;
        }
        Ok(None)
    }
}
