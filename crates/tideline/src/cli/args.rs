use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Virtualized chat list with date separators, backward pagination and touch gestures.
#[derive(Parser)]
#[command(version, about, long_about = None, author)]
pub struct Cli {
    /// Configuration file to use instead of the default location
    #[arg(long, env = "TIDELINE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// User id whose messages are shown as the viewer's own
    #[arg(long, default_value = "alice")]
    pub user: String,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Launch the interactive terminal demo (default)
    Tui {
        /// Size of the synthetic conversation
        #[arg(long, default_value_t = 400)]
        messages: usize,
    },
    /// Compute the render window for a message file without a terminal
    Window {
        /// JSON file holding an array of messages
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Scroll offset from the top of the content
        #[arg(long, default_value_t = 0)]
        scroll_top: u32,
        /// Visible height of the list
        #[arg(long)]
        viewport_height: u32,
    },
    /// Inspect or reset the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Print the resolved configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Delete the configuration file so defaults apply
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_tui() {
        let cli = Cli::try_parse_from(["tideline"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.user, "alice");
    }

    #[test]
    fn parses_window_arguments() {
        let cli = Cli::try_parse_from([
            "tideline",
            "--user",
            "bob",
            "window",
            "--input",
            "messages.json",
            "--scroll-top",
            "120",
            "--viewport-height",
            "600",
        ])
        .unwrap();

        assert_eq!(cli.user, "bob");
        match cli.command {
            Some(Commands::Window {
                input,
                scroll_top,
                viewport_height,
            }) => {
                assert_eq!(input, PathBuf::from("messages.json"));
                assert_eq!(scroll_top, 120);
                assert_eq!(viewport_height, 600);
            }
            _ => panic!("expected window command"),
        }
    }

    #[test]
    fn window_requires_viewport_height() {
        assert!(Cli::try_parse_from(["tideline", "window", "--input", "m.json"]).is_err());
    }
}
