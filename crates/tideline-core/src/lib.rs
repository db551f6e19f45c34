// Windowing, grouping, scroll and gesture logic for message lists without UI dependencies

pub mod callbacks;
pub mod config;
pub mod entry;
pub mod error;
pub mod gesture;
pub mod grouping;
pub mod height;
pub mod history;
pub mod pagination;
pub mod scroll;
pub mod selection;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod utils;
pub mod viewport;
pub mod window;

pub use callbacks::{NoopCallbacks, ViewportCallbacks};
pub use config::{GestureThresholds, Pixels, TidelineConfig, ViewportConfig};
pub use entry::{DateKey, DateSeparatorEntry, Entry, MessageEntry, RawMessage};
pub use error::{Error, Result};
pub use gesture::GestureIntent;
pub use viewport::MessageViewport;
pub use window::{RenderSlice, WindowRange};
