//! Diagnostic logging to stderr, so stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "warn";
const VERBOSE_LEVEL: &str = "debug";

/// Pick the filter directive: an explicit `YX_LOG` wins over `--verbose`.
fn filter_directive(verbose: bool, env_filter: Option<&str>) -> String {
    match (env_filter, verbose) {
        (Some(filter), _) => filter.to_string(),
        (None, true) => VERBOSE_LEVEL.to_string(),
        (None, false) => DEFAULT_LEVEL.to_string(),
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(verbose: bool, env_filter: Option<&str>) {
    let directive = filter_directive(verbose, env_filter);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
