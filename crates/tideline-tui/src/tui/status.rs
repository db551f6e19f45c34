//! Status bar fed by viewport callbacks.

use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexSet;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use tideline_core::callbacks::ViewportCallbacks;
use tideline_core::entry::MessageEntry;
use tideline_core::viewport::MessageViewport;

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];
const SNIPPET_CHARS: usize = 24;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusState {
    pub jump_visible: bool,
    pub history_requests: usize,
    pub selected: usize,
    pub last_action: Option<String>,
}

/// Callbacks that write into a shared [`StatusState`].
#[derive(Debug, Clone, Default)]
pub struct StatusCallbacks {
    state: Arc<Mutex<StatusState>>,
}

impl StatusCallbacks {
    pub fn snapshot(&self) -> StatusState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_last_action(&self, action: impl Into<String>) {
        let action = action.into();
        self.update(|s| s.last_action = Some(action));
    }

    fn update(&self, f: impl FnOnce(&mut StatusState)) {
        f(&mut self.state.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

impl ViewportCallbacks for StatusCallbacks {
    fn on_request_older_messages(&mut self) {
        self.update(|s| s.history_requests += 1);
    }

    fn on_reply(&mut self, entry: &MessageEntry) {
        let snippet: String = entry.message.content.chars().take(SNIPPET_CHARS).collect();
        let action = format!("Reply to {}: {snippet}", entry.user_id());
        self.update(|s| s.last_action = Some(action));
    }

    fn on_select_entries(&mut self, ids: &IndexSet<String>) {
        self.update(|s| s.selected = ids.len());
    }

    fn on_jump_to_bottom_visibility_change(&mut self, visible: bool) {
        self.update(|s| s.jump_visible = visible);
    }
}

/// Draw the one-row status bar.
pub fn render(
    f: &mut Frame,
    area: Rect,
    status: &StatusState,
    viewport: &MessageViewport,
    spinner: usize,
) {
    let bar = Style::default().bg(Color::Black).fg(Color::Gray);
    let mut left: Vec<Span<'static>> = Vec::new();

    if viewport.pagination().is_loading() {
        left.push(Span::styled(
            format!(" {} loading history ", SPINNER[spinner % SPINNER.len()]),
            bar.fg(Color::Cyan),
        ));
    } else if !viewport.pagination().has_more() {
        left.push(Span::styled(" start of conversation ", bar.fg(Color::DarkGray)));
    }

    if status.jump_visible {
        let unseen = viewport.unseen_count();
        let hint = if unseen > 0 {
            format!(" ↓ {unseen} new · End to jump ")
        } else {
            " ↓ End to jump to latest ".to_string()
        };
        left.push(Span::styled(
            hint,
            bar.fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }

    if viewport.selection().is_active() {
        left.push(Span::styled(
            format!(" {} selected · Esc to clear ", viewport.selection().len()),
            bar.fg(Color::Magenta),
        ));
    }

    let used = left.iter().map(Span::width).sum::<usize>();
    let used = u16::try_from(used).unwrap_or(u16::MAX);
    let [hints, rest] =
        Layout::horizontal([Constraint::Length(used), Constraint::Min(0)]).areas(area);

    f.render_widget(Paragraph::new("").style(bar), area);
    f.render_widget(Paragraph::new(Line::from(left)).style(bar), hints);

    // The last action gets whatever room the hints leave.
    if let Some(action) = &status.last_action {
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(format!("{action} "), bar)))
                .alignment(Alignment::Right),
            rest,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tideline_core::entry::RawMessage;

    #[test]
    fn callbacks_update_shared_state() {
        let callbacks = StatusCallbacks::default();
        let mut writer = callbacks.clone();

        writer.on_request_older_messages();
        writer.on_jump_to_bottom_visibility_change(true);
        let mut ids = IndexSet::new();
        ids.insert("a".to_string());
        writer.on_select_entries(&ids);
        writer.on_reply(&MessageEntry {
            message: RawMessage::new("m1", "bob", 0).with_content("hello there"),
            show_avatar: true,
            is_own_message: false,
        });

        assert_eq!(
            callbacks.snapshot(),
            StatusState {
                jump_visible: true,
                history_requests: 1,
                selected: 1,
                last_action: Some("Reply to bob: hello there".to_string()),
            }
        );
    }
}
