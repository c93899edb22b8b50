//! Logging setup for the `ltgraph` binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "ltgraph=warn,ltgraph_core=warn,error";
const VERBOSE_FILTER: &str = "ltgraph=debug,ltgraph_core=debug,info";
const QUIET_FILTER: &str = "error";

/// Pick the filter directive for the given verbosity flags. `--quiet` wins over `--verbose`.
pub fn filter_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        QUIET_FILTER
    } else if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    }
}

/// Install the global subscriber. Logs go to stderr so `-o -` output stays clean.
///
/// `RUST_LOG` overrides the flag-derived filter unless `quiet` is set.
pub fn init_logging(verbose: bool, quiet: bool) {
    let directive = filter_directive(verbose, quiet);
    let filter = if !quiet && std::env::var("RUST_LOG").is_ok() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
    } else {
        EnvFilter::new(directive)
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose);

    // a second init (tests) is harmless
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
