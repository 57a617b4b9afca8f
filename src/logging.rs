//! Diagnostic logging to stderr.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.  `RUST_LOG` wins if set; otherwise
/// `debug` picks between debug output and warnings only.
pub fn init(debug: bool) {
    let default = if debug { "incjc=debug" } else { "incjc=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}
