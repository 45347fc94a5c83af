//! Stderr log output and its verbosity

use tracing_subscriber::EnvFilter;

pub(crate) fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1..=3 => "debug",
        _ => "trace",
    }
}

/// Install a stderr subscriber. `RUST_LOG` wins over `-v` when set.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity > 0)
        .init();
}
