//! Line layout for entries. One terminal row is one pixel unit, so an entry's
//! measured height is simply the number of lines it lays out to.

use chrono::{Local, TimeZone};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use tideline_core::config::Pixels;
use tideline_core::entry::{DateSeparatorEntry, Entry, MessageEntry};
use tideline_core::selection::SelectionState;
use tideline_core::window::RenderSlice;
use unicode_width::UnicodeWidthStr;

/// Columns kept free on the side opposite a message's alignment.
const GUTTER: u16 = 6;

const SENDER_COLORS: [Color; 5] = [
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::Blue,
];

fn sender_color(user_id: &str) -> Color {
    let hash = user_id
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(usize::from(b)));
    SENDER_COLORS[hash % SENDER_COLORS.len()]
}

fn format_time(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// `──── Mon, 3 Mar 2025 ────` centred in `width` columns.
fn separator_lines(separator: &DateSeparatorEntry, width: u16) -> Vec<Line<'static>> {
    let label = format!(" {} ", separator.label());
    let fill = usize::from(width).saturating_sub(label.width()) / 2;
    let rule = "─".repeat(fill);
    vec![
        Line::from(vec![
            Span::styled(rule.clone(), Style::default().fg(Color::DarkGray)),
            Span::styled(label, Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(rule, Style::default().fg(Color::DarkGray)),
        ])
        .alignment(Alignment::Center),
        Line::default(),
    ]
}

fn message_lines(entry: &MessageEntry, width: u16, selected: bool) -> Vec<Line<'static>> {
    let alignment = if entry.is_own_message {
        Alignment::Right
    } else {
        Alignment::Left
    };
    let base = if selected {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };
    let message = &entry.message;
    let mut lines = Vec::new();

    if entry.show_avatar {
        let marker = if selected { "● " } else { "" };
        lines.push(
            Line::from(vec![
                Span::styled(marker.to_string(), base),
                Span::styled(
                    message.user_id.clone(),
                    base.fg(sender_color(&message.user_id))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" {}", format_time(message.timestamp)),
                    base.fg(Color::DarkGray),
                ),
            ])
            .alignment(alignment),
        );
    }

    let wrap_width = usize::from(width.saturating_sub(GUTTER).max(1));
    let body = if message.content.is_empty() {
        vec![std::borrow::Cow::Borrowed("")]
    } else {
        textwrap::wrap(&message.content, wrap_width)
    };
    for text in body {
        lines.push(Line::from(Span::styled(text.into_owned(), base)).alignment(alignment));
    }

    if !message.reactions.is_empty() {
        let summary = message
            .reactions
            .iter()
            .map(|r| format!("{} {}", r.emoji, r.user_ids.len()))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(Line::from(Span::styled(summary, base.fg(Color::Yellow))).alignment(alignment));
    }

    if message.thread_replies > 0 {
        let label = if message.thread_replies == 1 {
            "↳ 1 reply".to_string()
        } else {
            format!("↳ {} replies", message.thread_replies)
        };
        lines.push(Line::from(Span::styled(label, base.fg(Color::Blue))).alignment(alignment));
    }

    lines.push(Line::default());
    lines
}

/// Lay out one entry at `width` columns.
pub fn entry_lines(entry: &Entry, width: u16, selected: bool) -> Vec<Line<'static>> {
    match entry {
        Entry::Separator(separator) => separator_lines(separator, width),
        Entry::Message(message) => message_lines(message, width, selected),
    }
}

/// Height in rows of `entry` at `width` columns.
pub fn entry_height(entry: &Entry, width: u16) -> Pixels {
    entry_lines(entry, width, false).len() as Pixels
}

/// Draw the windowed entries into `area`, starting `scroll_top` rows into the
/// content.
pub fn render(
    f: &mut Frame,
    area: Rect,
    slice: &RenderSlice<'_>,
    scroll_top: Pixels,
    selection: &SelectionState,
) {
    let lines: Vec<Line<'static>> = slice
        .items
        .iter()
        .flat_map(|entry| entry_lines(entry, area.width, selection.contains(entry.id())))
        .collect();

    // The slice begins at `top_spacer`; skip down to the scroll offset.
    let skip = scroll_top.saturating_sub(slice.top_spacer);
    let skip = u16::try_from(skip).unwrap_or(u16::MAX);
    f.render_widget(Paragraph::new(lines).scroll((skip, 0)), area);
}

/// Index of the entry covering `content_row`, if it lies in the slice.
pub fn entry_at_row(
    slice: &RenderSlice<'_>,
    heights: &tideline_core::height::HeightModel,
    content_row: Pixels,
) -> Option<usize> {
    let mut top = slice.top_spacer;
    for (index, _) in slice.indexed() {
        let bottom = top.saturating_add(heights.height(index).ok()?);
        if (top..bottom).contains(&content_row) {
            return Some(index);
        }
        top = bottom;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};
    use tideline_core::entry::{DateKey, RawMessage, Reaction};
    use tideline_core::height::HeightModel;
    use tideline_core::window::WindowRange;

    fn message(content: &str, show_avatar: bool, own: bool) -> Entry {
        Entry::Message(MessageEntry {
            message: RawMessage::new("m1", "bob", 0).with_content(content),
            show_avatar,
            is_own_message: own,
        })
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn separator_is_label_plus_padding() {
        let entry = Entry::Separator(DateSeparatorEntry::new(DateKey::Unknown));
        assert_eq!(entry_height(&entry, 40), 2);
    }

    #[test]
    fn message_height_counts_header_wrapped_body_and_padding() {
        assert_eq!(entry_height(&message("short", true, false), 40), 3);
        assert_eq!(entry_height(&message("short", false, false), 40), 2);

        // 20 columns minus the gutter leaves 14 per line.
        let long = "aaaa bbbb cccc dddd eeee ffff gg";
        assert_eq!(entry_height(&message(long, false, false), 20), 4);
    }

    #[test]
    fn reactions_and_threads_add_rows() {
        let mut raw = RawMessage::new("m1", "bob", 0).with_content("hi");
        raw.reactions.push(Reaction {
            emoji: "+1".to_string(),
            user_ids: vec!["alice".to_string()],
        });
        raw.thread_replies = 2;
        let entry = Entry::Message(MessageEntry {
            message: raw,
            show_avatar: true,
            is_own_message: false,
        });
        assert_eq!(entry_height(&entry, 40), 5);
    }

    #[test]
    fn renders_from_scroll_offset_inside_slice() {
        let entries = vec![
            Entry::Separator(DateSeparatorEntry::new(DateKey::Unknown)),
            message("first body", true, false),
            message("second body", false, true),
        ];
        let mut heights = HeightModel::with_len(3, 3);
        for (i, entry) in entries.iter().enumerate() {
            heights.set_measured(i, entry_height(entry, 40)).unwrap();
        }
        let slice = RenderSlice::build(&entries, &heights, WindowRange::new(0, 3)).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(40, 4)).unwrap();
        terminal
            .draw(|f| render(f, f.area(), &slice, 2, &SelectionState::new()))
            .unwrap();
        let text = buffer_text(&terminal);

        assert!(!text.contains("Unknown date"));
        assert!(text.contains("bob"));
        assert!(text.contains("first body"));
        assert!(text.contains("second body"));
    }

    #[test]
    fn hit_testing_maps_rows_to_entries() {
        let entries = vec![
            Entry::Separator(DateSeparatorEntry::new(DateKey::Unknown)),
            message("first", true, false),
        ];
        let mut heights = HeightModel::with_len(3, 2);
        heights.set_measured(0, 2).unwrap();
        let slice = RenderSlice::build(&entries, &heights, WindowRange::new(0, 2)).unwrap();

        assert_eq!(entry_at_row(&slice, &heights, 0), Some(0));
        assert_eq!(entry_at_row(&slice, &heights, 1), Some(0));
        assert_eq!(entry_at_row(&slice, &heights, 2), Some(1));
        assert_eq!(entry_at_row(&slice, &heights, 4), Some(1));
        assert_eq!(entry_at_row(&slice, &heights, 5), None);
    }
}
