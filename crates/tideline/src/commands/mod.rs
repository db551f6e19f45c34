use async_trait::async_trait;
use eyre::Result;

pub mod config;
#[cfg(feature = "ui")]
pub mod tui;
pub mod window;

#[async_trait]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}
