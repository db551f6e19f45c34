use chrono::Local;
use std::io;
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn install<S>(subscriber: S) -> io::Result<()>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber).map_err(io::Error::other)
}

/// Initialize tracing with a file logger writing to a timestamp-named file
/// under `~/.tideline`. The filter comes from `RUST_LOG`.
///
/// Terminal UIs own stdout, so without a home directory logs go to stderr.
pub fn init_tracing() -> io::Result<()> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    if let Some(home_dir) = dirs::home_dir() {
        let log_dir = home_dir.join(".tideline");
        std::fs::create_dir_all(&log_dir)?;

        let file_name = format!("{timestamp}.log");
        let file_appender = rolling::never(&log_dir, &file_name);

        install(
            tracing_subscriber::registry()
                .with(
                    fmt::Layer::new()
                        .with_writer(file_appender)
                        .with_ansi(false)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(env_filter()),
        )?;

        tracing::debug!(
            target: "tideline::utils::tracing",
            path = %log_dir.join(file_name).display(),
            "Tracing initialized with file output"
        );
    } else {
        install(
            tracing_subscriber::registry()
                .with(
                    fmt::Layer::default()
                        .with_writer(io::stderr)
                        .with_ansi(true)
                        .with_target(true),
                )
                .with(env_filter()),
        )?;

        tracing::debug!(
            target: "tideline::utils::tracing",
            "Tracing initialized with stderr output"
        );
    }

    Ok(())
}
