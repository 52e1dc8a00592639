use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initialises the global logger from `RUST_LOG`.
///
/// Without an explicit filter, `verbose` selects debug output and info
/// otherwise.
pub(crate) fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);
    let _ = builder.format_timestamp_millis();

    // A logger may already be installed when driven from tests.
    let _ = builder.try_init();
}
