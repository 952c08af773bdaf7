//! Logger setup for the binary and tests.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initializes the global logger.
///
/// `verbose` lowers the default level from info to debug. `RUST_LOG` still
/// takes precedence.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);

    // A logger may already be installed (tests call this repeatedly).
    let _ = builder.try_init();
}
