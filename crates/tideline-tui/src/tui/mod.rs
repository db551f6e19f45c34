//! Terminal harness: drives a [`MessageViewport`] from crossterm input and
//! renders its window with ratatui.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::EventStream;
use futures::StreamExt;
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
    crossterm::event::{
        Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
    },
    layout::{Constraint, Layout, Rect},
};
use tideline_core::config::{Pixels, TidelineConfig};
use tideline_core::entry::{Entry, RawMessage};
use tideline_core::gesture::GestureIntent;
use tideline_core::history::{HistoryLoader, HistoryResponse, HistorySource};
use tideline_core::viewport::MessageViewport;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};

pub mod chat_list;
pub mod demo;
pub mod status;
pub mod terminal;

use status::StatusCallbacks;

const WHEEL_ROWS: i64 = 3;
const TICK_INTERVAL: Duration = Duration::from_millis(120);
const DEMO_HISTORY_DELAY: Duration = Duration::from_millis(600);
/// Measuring can shift the scroll target, which can bring new entries into
/// the window; a few passes settle it.
const MAX_LAYOUT_PASSES: usize = 4;
/// Approximate cell size, so gesture thresholds in pixels apply to mouse
/// drags measured in cells.
const CELL_WIDTH_PX: f64 = 8.0;
const CELL_HEIGHT_PX: f64 = 16.0;

const INCOMING_LINES: [&str; 4] = [
    "new message just landed",
    "are you still there?",
    "ping",
    "Sharing the notes from the call: the rollout goes ahead on Thursday, and the old endpoint stays up for another week.",
];

fn split(area: Rect) -> [Rect; 2] {
    Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area)
}

pub struct App<B: Backend> {
    terminal: Terminal<B>,
    viewport: MessageViewport,
    status: StatusCallbacks,
    loader: HistoryLoader,
    list_area: Rect,
    layout_width: u16,
    started: Instant,
    incoming: usize,
    spinner: usize,
    should_exit: bool,
}

impl<B: Backend> App<B> {
    pub fn new(
        terminal: Terminal<B>,
        config: &TidelineConfig,
        current_user_id: &str,
        messages: Vec<RawMessage>,
        has_more: bool,
        source: Arc<dyn HistorySource>,
    ) -> (Self, mpsc::UnboundedReceiver<HistoryResponse>) {
        let status = StatusCallbacks::default();
        let mut viewport = MessageViewport::new(current_user_id, config)
            .with_callbacks(Box::new(status.clone()));
        viewport.replace_conversation(messages, has_more);
        let (loader, history_rx) = HistoryLoader::new(source, config.viewport.history_page_size);

        (
            Self {
                terminal,
                viewport,
                status,
                loader,
                list_area: Rect::default(),
                layout_width: 0,
                started: Instant::now(),
                incoming: 0,
                spinner: 0,
                should_exit: false,
            },
            history_rx,
        )
    }

    pub fn viewport(&self) -> &MessageViewport {
        &self.viewport
    }

    pub fn status(&self) -> status::StatusState {
        self.status.snapshot()
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub async fn run(
        &mut self,
        mut history_rx: mpsc::UnboundedReceiver<HistoryResponse>,
    ) -> Result<()> {
        info!(
            target: "tideline::tui",
            entries = self.viewport.entries().len(),
            "Starting TUI"
        );

        let mut events = EventStream::new();
        let mut needs_redraw = true;
        let mut tick = tokio::time::interval(TICK_INTERVAL);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        while !self.should_exit {
            if needs_redraw {
                self.draw()?;
                needs_redraw = false;
            }

            tokio::select! {
                maybe_event = events.next() => {
                    match maybe_event {
                        Some(Ok(event)) => {
                            self.handle_event(&event)?;
                            needs_redraw = true;
                        }
                        Some(Err(e)) if e.kind() == io::ErrorKind::Interrupted => {
                            debug!(target: "tideline::tui", "Ignoring interrupted syscall");
                        }
                        Some(Err(e)) => {
                            error!(target: "tideline::tui", "Fatal input error: {}. Exiting.", e);
                            return Err(Error::from(e));
                        }
                        None => {
                            return Err(Error::EventProcessing("input stream closed".to_string()));
                        }
                    }
                }
                Some(response) = history_rx.recv() => {
                    self.handle_history_response(response)?;
                    needs_redraw = true;
                }
                _ = tick.tick() => {
                    if self.viewport.pagination().is_loading() {
                        self.spinner = self.spinner.wrapping_add(1);
                        needs_redraw = true;
                    }
                }
            }
        }

        Ok(())
    }

    /// Lay out, measure and draw one frame.
    pub fn draw(&mut self) -> Result<()> {
        self.layout()?;

        let status = self.status.snapshot();
        let viewport = &self.viewport;
        let slice = viewport.render_slice()?;
        let spinner = self.spinner;
        let list_area = self.list_area;

        self.terminal.draw(|f| {
            let [_, status_area] = split(f.area());
            chat_list::render(
                f,
                list_area,
                &slice,
                viewport.scroll_top(),
                viewport.selection(),
            );
            status::render(f, status_area, &status, viewport, spinner);
        })?;
        Ok(())
    }

    /// Size the viewport to the terminal and measure the window until the
    /// scroll position settles.
    fn layout(&mut self) -> Result<()> {
        let size = self.terminal.size()?;
        let [list_area, _] = split(Rect::new(0, 0, size.width, size.height));
        self.list_area = list_area;

        if list_area.width != self.layout_width {
            debug!(
                target: "tideline::tui",
                from = self.layout_width,
                to = list_area.width,
                "Width changed; remeasuring"
            );
            self.layout_width = list_area.width;
            self.viewport.invalidate_heights();
        }
        self.viewport
            .set_viewport_height(Pixels::from(list_area.height));

        for _ in 0..MAX_LAYOUT_PASSES {
            let moved = self.viewport.resolve_scroll_target()?.is_some();
            let measured = self.measure_window()?;
            if !moved && !measured {
                break;
            }
        }
        self.dispatch_history_request();

        if let Some(range) = self.viewport.refresh_window()? {
            debug!(
                target: "tideline::tui",
                start = range.start,
                end = range.end,
                "Window changed"
            );
        }
        Ok(())
    }

    /// Report heights for every windowed entry whose layout differs from the
    /// model. Returns whether anything changed.
    fn measure_window(&mut self) -> Result<bool> {
        let width = self.list_area.width;
        let updates: Vec<(usize, Pixels)> = {
            let heights = self.viewport.heights();
            self.viewport
                .render_slice()?
                .indexed()
                .filter_map(|(index, entry)| {
                    let height = chat_list::entry_height(entry, width);
                    let current = heights.is_measured(index).then(|| heights.height(index).ok());
                    (current != Some(Some(height))).then_some((index, height))
                })
                .collect()
        };

        for (index, height) in &updates {
            self.viewport.set_measured(*index, *height)?;
        }
        Ok(!updates.is_empty())
    }

    pub fn handle_event(&mut self, event: &Event) -> Result<()> {
        let now_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.handle_event_at(event, now_ms)
    }

    /// Handle an input event that occurred `now_ms` after startup.
    pub fn handle_event_at(&mut self, event: &Event, now_ms: u64) -> Result<()> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(*key),
            Event::Mouse(mouse) => self.handle_mouse(*mouse, now_ms),
            Event::Resize(width, height) => {
                debug!(target: "tideline::tui", width, height, "Terminal resized");
            }
            _ => {}
        }
        self.dispatch_history_request();
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let page = i64::from(self.viewport.viewport_height().max(1));
        match key.code {
            KeyCode::Char('q') => self.should_exit = true,
            KeyCode::Esc => {
                if self.viewport.selection().is_active() {
                    self.viewport.clear_selection();
                    self.status.set_last_action("Selection cleared");
                } else {
                    self.should_exit = true;
                }
            }
            KeyCode::End | KeyCode::Char('G') => self.viewport.jump_to_bottom(),
            KeyCode::Home | KeyCode::Char('g') => self.viewport.scroll_to_entry(0),
            KeyCode::PageUp => {
                self.viewport.scroll_by(-page);
            }
            KeyCode::PageDown => {
                self.viewport.scroll_by(page);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.viewport.scroll_by(-1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.viewport.scroll_by(1);
            }
            KeyCode::Char('n') => self.inject_incoming(),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now_ms: u64) {
        let x = f64::from(mouse.column) * CELL_WIDTH_PX;
        let y = f64::from(mouse.row) * CELL_HEIGHT_PX;

        match mouse.kind {
            MouseEventKind::ScrollUp => {
                self.viewport.scroll_by(-WHEEL_ROWS);
            }
            MouseEventKind::ScrollDown => {
                self.viewport.scroll_by(WHEEL_ROWS);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(index) = self.entry_index_at(mouse.row) {
                    self.viewport.touch_start(index, x, y, now_ms);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.viewport.touch_move(x, y, now_ms);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let intent = self.viewport.touch_end(x, y, now_ms);
                match &intent {
                    GestureIntent::None => self.tap(mouse.row),
                    GestureIntent::SwipeRevealActions { entry_id } => {
                        self.status
                            .set_last_action(format!("Actions for {entry_id}"));
                    }
                    GestureIntent::LongPressSelect { entry_id } => {
                        self.status.set_last_action(format!("Selected {entry_id}"));
                    }
                    GestureIntent::SwipeReply { .. } => {}
                }
            }
            _ => {}
        }
    }

    /// A tap toggles membership while selection mode is active.
    fn tap(&mut self, row: u16) {
        if !self.viewport.selection().is_active() {
            return;
        }
        let Some(index) = self.entry_index_at(row) else {
            return;
        };
        if let Some(Entry::Message(message)) = self.viewport.entries().get(index) {
            let id = message.id().to_string();
            self.viewport.toggle_selection(&id);
        }
    }

    /// Entry index under terminal row `row`, if it is inside the list.
    pub fn entry_index_at(&self, row: u16) -> Option<usize> {
        let area = self.list_area;
        if row < area.y || row >= area.bottom() {
            return None;
        }
        let content_row = self
            .viewport
            .scroll_top()
            .saturating_add(Pixels::from(row - area.y));
        let slice = self.viewport.render_slice().ok()?;
        chat_list::entry_at_row(&slice, self.viewport.heights(), content_row)
    }

    fn inject_incoming(&mut self) {
        let n = self.incoming;
        self.incoming += 1;
        let now = chrono::Utc::now().timestamp_millis();
        let latest = self
            .viewport
            .messages()
            .last()
            .and_then(|m| m.timestamp)
            .unwrap_or(now);

        let mut messages = self.viewport.messages().to_vec();
        messages.push(
            RawMessage::new(format!("live-{n}"), "bob", now.max(latest + 1))
                .with_content(INCOMING_LINES[n % INCOMING_LINES.len()]),
        );
        self.viewport.set_messages(messages);
        self.status.set_last_action("Incoming message");
    }

    fn dispatch_history_request(&mut self) {
        if let Some(ticket) = self.viewport.take_history_request() {
            let before = self.viewport.oldest_message_id().map(str::to_string);
            debug!(
                target: "tideline::tui",
                epoch = ticket.epoch(),
                ?before,
                "Loading older messages"
            );
            // Detached: the response comes back through the history channel.
            drop(self.loader.request(ticket, before));
        }
    }

    pub fn handle_history_response(&mut self, response: HistoryResponse) -> Result<()> {
        match response.result {
            Ok(page) => {
                let count = page.messages.len();
                if self
                    .viewport
                    .apply_history(response.ticket, page.messages, page.has_more)?
                {
                    self.status
                        .set_last_action(format!("Loaded {count} older messages"));
                }
            }
            Err(e) => {
                warn!(target: "tideline::tui", error = %e, "History load failed");
                if self.viewport.fail_history(response.ticket) {
                    self.status.set_last_action(format!("History failed: {e}"));
                }
            }
        }
        Ok(())
    }
}

/// Run the demo harness on the real terminal until the user quits.
pub async fn run_tui(
    config: TidelineConfig,
    current_user_id: String,
    message_count: usize,
) -> Result<()> {
    terminal::setup_panic_hook();
    let mut guard = terminal::SetupGuard::new();

    let mut stdout = io::stdout();
    terminal::setup(&mut stdout)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let all = demo::demo_conversation(message_count, chrono::Utc::now().timestamp_millis());
    let split = all.len().saturating_sub(config.viewport.history_page_size);
    let initial = all[split..].to_vec();
    let has_more = split > 0;
    info!(
        target: "tideline::tui",
        initial = initial.len(),
        remaining = split,
        "Prepared demo conversation"
    );
    // The source holds the whole conversation so every page lookup finds the
    // viewport's oldest id.
    let source = Arc::new(demo::DemoHistory::new(all, DEMO_HISTORY_DELAY));

    let (mut app, history_rx) =
        App::new(terminal, &config, &current_user_id, initial, has_more, source);
    guard.disarm();

    let result = app.run(history_rx).await;
    terminal::cleanup();
    result
}
