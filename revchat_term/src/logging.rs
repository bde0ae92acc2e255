use std::{path::Path, sync::Mutex};

use anyhow::Context;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};

/// The terminal is owned by the UI, so logs only ever go to a file.
pub fn configure_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file '{}'", path.display()))?;

    let file_log = tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(false)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::time())
        .with_writer(Mutex::new(file));
    let subscriber = Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(file_log);

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
