pub mod error;
pub mod tui;

pub use tui::{App, run_tui};
