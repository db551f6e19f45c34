use super::Command;
use async_trait::async_trait;
use eyre::Result;
use tideline_core::config::{TidelineConfig, ViewportConfig};

pub struct TuiCommand {
    pub config: TidelineConfig,
    pub user: String,
    pub messages: usize,
}

impl TuiCommand {
    /// The terminal measures in rows, so the viewport block always uses the
    /// row preset. Gesture thresholds come from the loaded file.
    pub fn new(loaded: TidelineConfig, user: String, messages: usize) -> Self {
        Self {
            config: TidelineConfig {
                viewport: ViewportConfig::terminal(),
                ..loaded
            },
            user,
            messages,
        }
    }
}

#[async_trait]
impl Command for TuiCommand {
    async fn execute(&self) -> Result<()> {
        tideline_tui::run_tui(self.config.clone(), self.user.clone(), self.messages)
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tideline_core::config::GestureThresholds;

    #[test]
    fn keeps_gestures_and_uses_row_preset() {
        let loaded = TidelineConfig {
            gestures: GestureThresholds {
                long_press_ms: 900,
                ..GestureThresholds::default()
            },
            ..TidelineConfig::default()
        };

        let command = TuiCommand::new(loaded, "bob".to_string(), 25);
        assert_eq!(command.config.viewport, ViewportConfig::terminal());
        assert_eq!(command.config.gestures.long_press_ms, 900);
    }
}
