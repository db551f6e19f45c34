use super::Command;
use crate::error::Error;
use async_trait::async_trait;
use chrono::TimeZone;
use eyre::Result;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tideline_core::config::{Pixels, TidelineConfig};
use tideline_core::entry::{Entry, RawMessage};
use tideline_core::grouping::{flatten, flatten_in};
use tideline_core::height::HeightModel;
use tideline_core::scroll::is_at_bottom_within;
use tideline_core::window::{RenderSlice, WindowCalculator, WindowRange};
use tracing::debug;

pub struct WindowCommand {
    pub config: TidelineConfig,
    pub user: String,
    pub input: PathBuf,
    pub scroll_top: Pixels,
    pub viewport_height: Pixels,
}

/// What a view layer would render for one scroll position, with every entry
/// at its estimated height.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WindowReport {
    pub entries: usize,
    pub content_height: Pixels,
    pub range: WindowRange,
    pub top_spacer: Pixels,
    pub bottom_spacer: Pixels,
    pub at_bottom: bool,
    pub items: Vec<WindowItem>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WindowItem {
    pub id: String,
    pub kind: &'static str,
}

#[async_trait]
impl Command for WindowCommand {
    async fn execute(&self) -> Result<()> {
        self.run().map_err(Into::into)
    }
}

impl WindowCommand {
    fn run(&self) -> std::result::Result<(), Error> {
        let contents = std::fs::read_to_string(&self.input)?;
        let messages: Vec<RawMessage> = serde_json::from_str(&contents)?;
        debug!(
            target: "tideline::window",
            count = messages.len(),
            input = %self.input.display(),
            "Loaded messages"
        );

        let entries = flatten(&messages, &self.user);
        let report = window_report(
            &entries,
            &self.config,
            self.scroll_top,
            self.viewport_height,
        )?;

        let mut stdout = std::io::stdout();
        writeln!(stdout, "{}", serde_json::to_string_pretty(&report)?)?;
        Ok(())
    }
}

/// Like the command, but grouping days in `tz`.
pub fn window_report_in<Tz: TimeZone>(
    messages: &[RawMessage],
    user: &str,
    config: &TidelineConfig,
    scroll_top: Pixels,
    viewport_height: Pixels,
    tz: &Tz,
) -> std::result::Result<WindowReport, Error> {
    let entries = flatten_in(messages, user, tz);
    window_report(&entries, config, scroll_top, viewport_height)
}

fn window_report(
    entries: &[Entry],
    config: &TidelineConfig,
    scroll_top: Pixels,
    viewport_height: Pixels,
) -> std::result::Result<WindowReport, Error> {
    let heights = HeightModel::with_len(config.viewport.estimate_height, entries.len());
    let calculator = WindowCalculator::from_config(&config.viewport);
    let range = calculator.compute_window(&heights, scroll_top, viewport_height, entries.len())?;
    let slice = RenderSlice::build(entries, &heights, range)?;
    let content_height = heights.total_height();

    Ok(WindowReport {
        entries: entries.len(),
        content_height,
        range,
        top_spacer: slice.top_spacer,
        bottom_spacer: slice.bottom_spacer,
        at_bottom: is_at_bottom_within(
            scroll_top,
            viewport_height,
            content_height.max(viewport_height),
            config.viewport.at_bottom_epsilon,
        ),
        items: slice
            .items
            .iter()
            .map(|entry| WindowItem {
                id: entry.id().to_string(),
                kind: entry.kind().into(),
            })
            .collect(),
    })
}
