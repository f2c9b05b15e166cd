use anyhow::Context;
use tracing::subscriber::set_global_default;
use tracing::Subscriber;
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

/// Compose multiple layers into a `tracing`'s subscriber.
///
/// `RUST_LOG` takes precedence over `default_env_filter`.
fn get_subscriber(default_env_filter: &str) -> impl Subscriber + Sync + Send {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_env_filter));
    tracing_subscriber::fmt().with_env_filter(filter).finish()
}

/// Routes `log` records and request spans to a single `tracing` subscriber.
pub fn init_logger(default_env_filter: &str) -> anyhow::Result<()> {
    let subscriber = get_subscriber(default_env_filter);
    LogTracer::init().context("failed to bridge log records")?;
    set_global_default(subscriber).context("failed to set subscriber")?;
    Ok(())
}
