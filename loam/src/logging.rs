//! Log output of the server.

use tracing::subscriber;
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, or by `default_filter`
/// when it is unset, and forwards `log` records to it.
pub fn init(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))?;
    let fmt = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    subscriber::set_global_default(fmt)?;
    LogTracer::init()?;
    Ok(())
}
