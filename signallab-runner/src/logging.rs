//! Tracing subscriber setup for the CLI.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "signallab=info,warn";

/// Install the global subscriber writing to stderr.
///
/// `RUST_LOG` overrides [`DEFAULT_FILTER`]. With `json` each event is one
/// JSON line; otherwise compact human-readable output. Fails if a global
/// subscriber is already set.
pub fn init_tracing(json: bool) -> Result<()> {
    let env_filter = build_filter(std::env::var("RUST_LOG").ok().as_deref());
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .json(),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .compact(),
            )
            .try_init()?;
    }
    Ok(())
}

fn build_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
