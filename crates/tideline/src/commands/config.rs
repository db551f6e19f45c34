use super::Command;
use crate::error::Error;
use async_trait::async_trait;
use eyre::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tideline_core::config::TidelineConfig;
use tracing::info;

pub struct ConfigCommand {
    pub action: ConfigAction,
    /// File to act on; the default location when `None`.
    pub path: Option<PathBuf>,
}

pub enum ConfigAction {
    Show,
    Path,
    Reset,
}

#[async_trait]
impl Command for ConfigCommand {
    async fn execute(&self) -> Result<()> {
        let mut stdout = std::io::stdout();
        match &self.action {
            ConfigAction::Show => self.show(&mut stdout).map_err(Into::into),
            ConfigAction::Path => self.print_path(&mut stdout).map_err(Into::into),
            ConfigAction::Reset => self.reset(&mut stdout).map_err(Into::into),
        }
    }
}

impl ConfigCommand {
    fn resolve_path(&self) -> std::result::Result<PathBuf, Error> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(TidelineConfig::config_path()?),
        }
    }

    fn show(&self, out: &mut impl Write) -> std::result::Result<(), Error> {
        let path = self.resolve_path()?;
        let config = TidelineConfig::load_from(&path)?;

        writeln!(out, "Config file: {}", describe(&path))?;
        writeln!(out, "\n{}", toml::to_string_pretty(&config)?)?;
        Ok(())
    }

    fn print_path(&self, out: &mut impl Write) -> std::result::Result<(), Error> {
        writeln!(out, "{}", self.resolve_path()?.display())?;
        Ok(())
    }

    fn reset(&self, out: &mut impl Write) -> std::result::Result<(), Error> {
        let path = self.resolve_path()?;
        if path.exists() {
            std::fs::remove_file(&path)?;
            info!(target: "tideline::config", path = %path.display(), "Removed config file");
            writeln!(out, "Removed {}; defaults apply.", path.display())?;
        } else {
            writeln!(out, "No config file at {}; defaults already apply.", path.display())?;
        }
        Ok(())
    }
}

fn describe(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not present, showing defaults)", path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tideline_core::config::ViewportConfig;

    fn command(action: ConfigAction, path: &Path) -> ConfigCommand {
        ConfigCommand {
            action,
            path: Some(path.to_path_buf()),
        }
    }

    #[test]
    fn show_prints_defaults_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut out = Vec::new();

        command(ConfigAction::Show, &path).show(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("not present"));
        assert!(text.contains("estimate-height = 80"));
        assert!(text.contains("long-press-ms = 500"));
    }

    #[test]
    fn show_reflects_saved_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        TidelineConfig {
            viewport: ViewportConfig::terminal(),
            ..TidelineConfig::default()
        }
        .save_to(&path)
        .unwrap();

        let mut out = Vec::new();
        command(ConfigAction::Show, &path).show(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("estimate-height = 3"));
        assert!(!text.contains("not present"));
    }

    #[test]
    fn reset_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        TidelineConfig::default().save_to(&path).unwrap();

        let mut out = Vec::new();
        command(ConfigAction::Reset, &path).reset(&mut out).unwrap();
        assert!(!path.exists());

        // A second reset is a no-op.
        let mut out = Vec::new();
        command(ConfigAction::Reset, &path).reset(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("No config file"));
    }

    #[test]
    fn path_prints_the_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut out = Vec::new();

        command(ConfigAction::Path, &path).print_path(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), path.display().to_string());
    }
}
