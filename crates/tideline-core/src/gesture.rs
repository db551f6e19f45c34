//! Touch gesture classification for a single active touch sequence.
//!
//! A sequence is `Idle -> Tracking -> Idle`. Nothing is classified until
//! touch-end; moves only update the current sample for visual feedback.

use strum::Display;
use tracing::debug;

use crate::config::GestureThresholds;

#[derive(Debug, Clone, PartialEq)]
pub struct TouchSample {
    pub x: f64,
    pub y: f64,
    pub timestamp_ms: u64,
    pub entry_id: String,
}

impl TouchSample {
    pub fn new(entry_id: impl Into<String>, x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self {
            x,
            y,
            timestamp_ms,
            entry_id: entry_id.into(),
        }
    }
}

/// Offset of the current touch position from where it started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement {
    pub dx: f64,
    pub dy: f64,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum GestureIntent {
    /// Horizontal swipe to the right: reply to the entry.
    SwipeReply { entry_id: String },
    /// Horizontal swipe to the left: reveal actions and select the entry.
    SwipeRevealActions { entry_id: String },
    /// Touch held past the long-press threshold: select the entry.
    LongPressSelect { entry_id: String },
    /// A tap, or a touch-end without a matching start.
    None,
}

impl GestureIntent {
    pub fn entry_id(&self) -> Option<&str> {
        match self {
            GestureIntent::SwipeReply { entry_id }
            | GestureIntent::SwipeRevealActions { entry_id }
            | GestureIntent::LongPressSelect { entry_id } => Some(entry_id),
            GestureIntent::None => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
enum GestureState {
    #[default]
    Idle,
    Tracking {
        start: TouchSample,
        current: TouchSample,
    },
}

#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    thresholds: GestureThresholds,
    state: GestureState,
}

impl GestureClassifier {
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self {
            thresholds,
            state: GestureState::Idle,
        }
    }

    pub fn thresholds(&self) -> &GestureThresholds {
        &self.thresholds
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, GestureState::Tracking { .. })
    }

    /// Entry the active sequence started on.
    pub fn tracked_entry(&self) -> Option<&str> {
        match &self.state {
            GestureState::Tracking { start, .. } => Some(&start.entry_id),
            GestureState::Idle => None,
        }
    }

    /// Begin tracking. A start while already tracking replaces the old
    /// sequence entirely.
    pub fn touch_start(&mut self, sample: TouchSample) {
        if let GestureState::Tracking { start, .. } = &self.state {
            debug!(
                target: "tideline::gesture",
                previous = %start.entry_id,
                next = %sample.entry_id,
                "Touch start while tracking; restarting on new entry"
            );
        }
        self.state = GestureState::Tracking {
            current: sample.clone(),
            start: sample,
        };
    }

    /// Update the current position. Returns the displacement from the start
    /// for transient feedback, or `None` when idle.
    pub fn touch_move(&mut self, x: f64, y: f64, timestamp_ms: u64) -> Option<Displacement> {
        let GestureState::Tracking { start, current } = &mut self.state else {
            return None;
        };
        current.x = x;
        current.y = y;
        current.timestamp_ms = timestamp_ms;
        Some(Displacement {
            dx: x - start.x,
            dy: y - start.y,
            elapsed_ms: timestamp_ms.saturating_sub(start.timestamp_ms),
        })
    }

    /// Finish the sequence and classify it. Always returns to idle.
    pub fn touch_end(&mut self, x: f64, y: f64, timestamp_ms: u64) -> GestureIntent {
        let GestureState::Tracking { start, .. } = std::mem::take(&mut self.state) else {
            debug!(target: "tideline::gesture", "Touch end without start ignored");
            return GestureIntent::None;
        };

        let intent = self.classify(
            Displacement {
                dx: x - start.x,
                dy: y - start.y,
                elapsed_ms: timestamp_ms.saturating_sub(start.timestamp_ms),
            },
            start.entry_id,
        );
        debug!(target: "tideline::gesture", %intent, "Classified touch sequence");
        intent
    }

    /// Drop any tracked samples without classifying.
    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
    }

    fn classify(&self, d: Displacement, entry_id: String) -> GestureIntent {
        let t = &self.thresholds;
        if d.elapsed_ms > t.long_press_ms {
            return GestureIntent::LongPressSelect { entry_id };
        }

        let is_swipe = d.dx.abs() > t.swipe_min_dx
            && d.elapsed_ms < t.long_press_ms
            && d.dy.abs() < t.swipe_max_dy;
        if !is_swipe {
            return GestureIntent::None;
        }

        if d.dx > 0.0 {
            GestureIntent::SwipeReply { entry_id }
        } else {
            GestureIntent::SwipeRevealActions { entry_id }
        }
    }
}
