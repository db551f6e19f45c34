use ratatui::crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Which terminal modes are currently enabled, so cleanup can run from the
/// normal exit path, an early return and the panic hook without doubling up.
pub struct TerminalState {
    pub(crate) raw: AtomicBool,
    pub(crate) alt_screen: AtomicBool,
    pub(crate) mouse_capture: AtomicBool,
}

impl Default for TerminalState {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalState {
    pub const fn new() -> Self {
        Self {
            raw: AtomicBool::new(false),
            alt_screen: AtomicBool::new(false),
            mouse_capture: AtomicBool::new(false),
        }
    }
}

pub static TERMINAL_STATE: TerminalState = TerminalState::new();

/// Enable raw mode, the alternate screen and mouse capture. Flags are set
/// only after each step succeeds.
pub fn setup<W: Write>(w: &mut W) -> io::Result<()> {
    enable_raw_mode()?;
    TERMINAL_STATE.raw.store(true, Ordering::Relaxed);

    execute!(w, EnterAlternateScreen)?;
    TERMINAL_STATE.alt_screen.store(true, Ordering::Relaxed);

    // Drags and button releases drive the gesture classifier.
    execute!(w, EnableMouseCapture)?;
    TERMINAL_STATE.mouse_capture.store(true, Ordering::Relaxed);

    Ok(())
}

/// Undo whatever `setup` enabled, writing escape sequences to `writer`.
pub fn cleanup_with_writer<W: Write>(writer: &mut W) {
    if TERMINAL_STATE.mouse_capture.swap(false, Ordering::Relaxed) {
        let _ = execute!(writer, DisableMouseCapture);
    }
    if TERMINAL_STATE.alt_screen.swap(false, Ordering::Relaxed) {
        let _ = execute!(writer, LeaveAlternateScreen);
    }
    if TERMINAL_STATE.raw.swap(false, Ordering::Relaxed) {
        let _ = disable_raw_mode();
    }
    let _ = writer.flush();
}

/// Best-effort cleanup on stdout.
pub fn cleanup() {
    let mut out = io::stdout();
    cleanup_with_writer(&mut out);
}

/// Restore the terminal before the default panic output is printed.
pub fn setup_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        cleanup();
        default_hook(panic_info);
    }));
}

/// Runs [`cleanup`] on drop unless disarmed; covers early returns between
/// setup and the start of the event loop.
pub struct SetupGuard {
    armed: bool,
}

impl Default for SetupGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupGuard {
    pub fn new() -> Self {
        Self { armed: true }
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for SetupGuard {
    fn drop(&mut self) {
        if self.armed {
            cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_is_idempotent_when_nothing_was_enabled() {
        let mut sink: Vec<u8> = Vec::new();
        cleanup_with_writer(&mut sink);
        cleanup_with_writer(&mut sink);
        assert!(sink.is_empty());
    }
}
