//! Scroll-position policy: bottom detection, follow-on-arrival and the
//! jump-to-bottom affordance.

use crate::config::{DEFAULT_AT_BOTTOM_EPSILON, Pixels};

/// True when the viewport bottom is within `DEFAULT_AT_BOTTOM_EPSILON` of the
/// content bottom.
pub fn is_at_bottom(scroll_top: Pixels, client_height: Pixels, scroll_height: Pixels) -> bool {
    is_at_bottom_within(
        scroll_top,
        client_height,
        scroll_height,
        DEFAULT_AT_BOTTOM_EPSILON,
    )
}

pub fn is_at_bottom_within(
    scroll_top: Pixels,
    client_height: Pixels,
    scroll_height: Pixels,
    epsilon: Pixels,
) -> bool {
    let gap = i64::from(scroll_height) - i64::from(scroll_top) - i64::from(client_height);
    gap.abs() < i64::from(epsilon)
}

/// Pending request to move the scroll position, resolved once the content
/// height is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Bottom,
    /// Absolute scroll offset.
    Offset(Pixels),
    /// Bring the entry at this index to the top of the viewport.
    Entry(usize),
}

/// What to do after the message count changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalAction {
    /// The viewer was following the bottom; keep following.
    FollowToBottom,
    /// The viewer is reading history; surface the affordance instead.
    ShowJumpToBottom { unseen: usize },
    None,
}

#[derive(Debug, Clone)]
pub struct ScrollController {
    epsilon: Pixels,
    /// At-bottom state from the most recent scroll observation.
    at_bottom: bool,
    last_count: usize,
    jump_visible: bool,
    /// Messages that arrived while scrolled away from the bottom.
    unseen: usize,
}

impl Default for ScrollController {
    fn default() -> Self {
        Self::new(DEFAULT_AT_BOTTOM_EPSILON)
    }
}

impl ScrollController {
    pub fn new(epsilon: Pixels) -> Self {
        Self {
            epsilon,
            at_bottom: true,
            last_count: 0,
            jump_visible: false,
            unseen: 0,
        }
    }

    pub fn is_at_bottom(
        &self,
        scroll_top: Pixels,
        client_height: Pixels,
        scroll_height: Pixels,
    ) -> bool {
        is_at_bottom_within(scroll_top, client_height, scroll_height, self.epsilon)
    }

    pub fn was_at_bottom(&self) -> bool {
        self.at_bottom
    }

    pub fn jump_visible(&self) -> bool {
        self.jump_visible
    }

    pub fn unseen(&self) -> usize {
        self.unseen
    }

    /// Record a scroll observation. Returns the new affordance visibility
    /// when it changed.
    pub fn observe_scroll(
        &mut self,
        scroll_top: Pixels,
        client_height: Pixels,
        scroll_height: Pixels,
    ) -> Option<bool> {
        self.at_bottom = self.is_at_bottom(scroll_top, client_height, scroll_height);
        if self.at_bottom {
            self.unseen = 0;
        }
        self.set_jump_visible(!self.at_bottom)
    }

    /// Decide how to react to a new message count. Uses the at-bottom state
    /// recorded *before* the new content was laid out.
    pub fn on_count_changed(&mut self, new_count: usize) -> ArrivalAction {
        let previous = std::mem::replace(&mut self.last_count, new_count);
        if new_count <= previous {
            return ArrivalAction::None;
        }

        if self.at_bottom {
            ArrivalAction::FollowToBottom
        } else {
            self.unseen += new_count - previous;
            self.jump_visible = true;
            ArrivalAction::ShowJumpToBottom {
                unseen: self.unseen,
            }
        }
    }

    /// Count changes that must not count as arrivals, such as prepended
    /// history or a conversation switch.
    pub fn sync_count(&mut self, count: usize) {
        self.last_count = count;
    }

    /// The viewer asked to return to the newest entry.
    pub fn jump_to_bottom(&mut self) -> Option<bool> {
        self.at_bottom = true;
        self.unseen = 0;
        self.set_jump_visible(false)
    }

    /// Forget everything; used on conversation switch.
    pub fn reset(&mut self, count: usize) {
        self.at_bottom = true;
        self.last_count = count;
        self.unseen = 0;
        self.jump_visible = false;
    }

    fn set_jump_visible(&mut self, visible: bool) -> Option<bool> {
        if self.jump_visible == visible {
            None
        } else {
            self.jump_visible = visible;
            Some(visible)
        }
    }
}
