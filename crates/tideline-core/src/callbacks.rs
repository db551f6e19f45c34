use indexmap::IndexSet;

use crate::entry::MessageEntry;

/// Outbound notifications from the viewport to the host application.
///
/// Every method is fire-and-forget; nothing is read back. The defaults do
/// nothing so hosts only implement what they care about.
pub trait ViewportCallbacks: Send {
    /// Older history should be fetched.
    fn on_request_older_messages(&mut self) {}

    /// The user swiped right on a message.
    fn on_reply(&mut self, _entry: &MessageEntry) {}

    /// The selection set changed through a gesture.
    fn on_select_entries(&mut self, _ids: &IndexSet<String>) {}

    /// The "jump to bottom" affordance should be shown or hidden.
    fn on_jump_to_bottom_visibility_change(&mut self, _visible: bool) {}
}

/// Callbacks that ignore everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl ViewportCallbacks for NoopCallbacks {}
