use clap::Parser;
use eyre::Result;

use tideline::cli::{Cli, Commands, ConfigCommands};
use tideline::commands::{
    Command,
    config::{ConfigAction, ConfigCommand},
    window::WindowCommand,
};
use tideline_core::config::TidelineConfig;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre for better error reports
    color_eyre::install()?;

    let cli = Cli::parse();

    // Initialize tracing (level configured via RUST_LOG env var)
    tideline_core::utils::tracing::init_tracing()?;

    // A broken file falls back to defaults so `config reset` can still run
    let config = match cli.config.clone() {
        Some(path) => Ok(path),
        None => TidelineConfig::config_path(),
    }
    .map(|path| TidelineConfig::load_or_default(&path))
    .unwrap_or_default();
    debug!(target: "tideline::main", ?config, "Resolved configuration");

    // If no subcommand specified, default to TUI
    let cmd = cli
        .command
        .clone()
        .unwrap_or(Commands::Tui { messages: 400 });

    match cmd {
        Commands::Tui { messages } => {
            #[cfg(feature = "ui")]
            {
                let command =
                    tideline::commands::tui::TuiCommand::new(config, cli.user.clone(), messages);
                command.execute().await
            }
            #[cfg(not(feature = "ui"))]
            {
                let _ = (config, messages);
                eyre::bail!("tideline was built without the terminal UI")
            }
        }
        Commands::Window {
            input,
            scroll_top,
            viewport_height,
        } => {
            let command = WindowCommand {
                config,
                user: cli.user.clone(),
                input,
                scroll_top,
                viewport_height,
            };
            command.execute().await
        }
        Commands::Config { action } => {
            let action = match action {
                ConfigCommands::Show => ConfigAction::Show,
                ConfigCommands::Path => ConfigAction::Path,
                ConfigCommands::Reset => ConfigAction::Reset,
            };
            let command = ConfigCommand {
                action,
                path: cli.config.clone(),
            };
            command.execute().await
        }
    }
}
