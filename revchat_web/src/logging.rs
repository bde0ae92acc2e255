use tracing::Level;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};

pub fn configure_logging() -> anyhow::Result<()> {
    let stdout_log = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::time())
        .map_writer(|x| x.with_max_level(Level::DEBUG));
    let subscriber = Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(stdout_log);

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
