//! Logging initialization.
//!
//! Diagnostics go to stderr through `tracing`; the per-patch progress a run
//! prints goes to stdout and is not affected by any of this.
//!
//! - the filter comes from `RUST_LOG` (default `warn`)
//! - `--log-format text` → compact human-readable lines
//! - `--log-format json` → one JSON object per event, span fields included

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// How diagnostics are rendered on stderr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(format: LogFormat) {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
            )
            .try_init(),
    };
    if let Err(e) = result {
        tracing::debug!("logging already initialized: {e}");
    }
}
