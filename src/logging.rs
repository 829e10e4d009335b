//! Logging setup: tracing events go to stderr so stdout carries only the report.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Map `-v` occurrences to a base level.
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Build the filter from the base level, keeping dependency chatter quiet
/// unless tracing everything.
fn build_filter(level: &str) -> Result<EnvFilter> {
    let mut directives = vec![level.to_string()];
    if level != "trace" {
        for target in ["arrow", "parquet", "duckdb"] {
            directives.push(format!("{target}=warn"));
        }
    }
    Ok(EnvFilter::try_new(directives.join(","))?)
}

/// Install the global subscriber. Safe to call more than once; later calls
/// leave the first subscriber in place.
pub fn init(verbosity: u8) -> Result<()> {
    let filter = build_filter(level_for_verbosity(verbosity))?;

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .try_init();

    if installed.is_err() {
        tracing::debug!("logging already initialised");
    }
    Ok(())
}
