/// Installs a `tracing` subscriber printing to stderr.
///
/// The filter is read from `RUST_LOG` and falls back to `info`. Fails if a
/// global subscriber has already been set.
#[cfg(feature = "logging")]
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()?;

    Ok(())
}
