use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::LogFormat;

const DEFAULT_FILTER: &str = "vrsi=info";

/// Install the global subscriber; logs go to stderr so stdout stays a clean table.
///
/// `RUST_LOG` overrides the default `vrsi=info` filter.
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .try_init()?;
    Ok(())
}
