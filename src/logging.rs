//! Optional `env_logger` setup for binaries and examples embedding the runner.

use env_logger::Env;

/// Initializes logging from `RUST_LOG`, defaulting to `info`.
///
/// Returns `false` when a logger was already installed.
pub fn init() -> bool {
    init_with_filter("info")
}

/// Initializes logging from `RUST_LOG`, falling back to `filter`.
pub fn init_with_filter(filter: &str) -> bool {
    env_logger::Builder::from_env(Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
