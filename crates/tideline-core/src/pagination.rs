//! Single-flight guard and epoch tracking for backward pagination.

use crate::config::Pixels;

/// Handle for one in-flight history request. Carries the epoch captured when
/// the request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryTicket {
    epoch: u64,
}

impl HistoryTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    has_more: bool,
    loading: bool,
    /// Bumped whenever the sequence is replaced; stale tickets no longer match.
    epoch: u64,
}

impl PaginationState {
    pub fn new(has_more: bool) -> Self {
        Self {
            has_more,
            loading: false,
            epoch: 0,
        }
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn set_has_more(&mut self, has_more: bool) {
        self.has_more = has_more;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Ticket of the request currently in flight.
    pub fn in_flight(&self) -> Option<HistoryTicket> {
        self.loading.then_some(HistoryTicket { epoch: self.epoch })
    }

    /// Near the top, more history exists, and nothing is already loading.
    pub fn should_request(&self, scroll_top: Pixels, threshold: Pixels) -> bool {
        scroll_top < threshold && self.has_more && !self.loading
    }

    /// Mark a request as in flight. `None` if one already is or nothing
    /// remains to load.
    pub fn begin(&mut self) -> Option<HistoryTicket> {
        if self.loading || !self.has_more {
            return None;
        }
        self.loading = true;
        Some(HistoryTicket { epoch: self.epoch })
    }

    /// Settle a request. Returns whether its results belong to the current
    /// sequence; stale tickets leave the loading flag untouched.
    pub fn settle(&mut self, ticket: HistoryTicket) -> bool {
        if ticket.epoch != self.epoch {
            tracing::debug!(
                target: "tideline::pagination",
                ticket_epoch = ticket.epoch,
                current_epoch = self.epoch,
                "Discarding stale history response"
            );
            return false;
        }
        self.loading = false;
        true
    }

    /// Sequence replaced: invalidate outstanding tickets.
    pub fn reset(&mut self, has_more: bool) {
        self.epoch = self.epoch.wrapping_add(1);
        self.loading = false;
        self.has_more = has_more;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_flight() {
        let mut state = PaginationState::new(true);
        assert!(state.should_request(10, 100));
        let ticket = state.begin().unwrap();
        assert!(!state.should_request(10, 100));
        assert!(state.begin().is_none());

        assert!(state.settle(ticket));
        assert!(!state.is_loading());
        assert!(state.should_request(10, 100));
    }

    #[test]
    fn threshold_and_has_more_gate_requests() {
        let mut state = PaginationState::new(true);
        assert!(!state.should_request(100, 100));
        state.set_has_more(false);
        assert!(!state.should_request(0, 100));
        assert!(state.begin().is_none());
    }

    #[test]
    fn stale_ticket_is_rejected_after_reset() {
        let mut state = PaginationState::new(true);
        let stale = state.begin().unwrap();
        state.reset(true);
        assert!(!state.is_loading());

        let fresh = state.begin().unwrap();
        assert!(!state.settle(stale));
        assert!(state.is_loading(), "stale settle must not clear the new flight");
        assert!(state.settle(fresh));
        assert_ne!(stale.epoch(), fresh.epoch());
    }
}
