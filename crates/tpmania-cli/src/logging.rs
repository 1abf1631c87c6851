//! Log output setup.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor `--verbose` is given.
pub const DEFAULT_FILTER: &str = "tpmania=info,warn";

/// Filter directives for a `--verbose` count.
///
/// Zero means the default filter; `RUST_LOG` still takes precedence then.
pub fn filter_directives(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("tpmania=debug,warn"),
        _ => Some("tpmania=trace,warn"),
    }
}

/// Install the global subscriber.
///
/// Records from the library crates, which log through the `log` facade,
/// are picked up by the same subscriber.
pub fn init_logging(verbose: u8) {
    let filter = match filter_directives(verbose) {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
