//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system with the `RUST_LOG` environment filter
///
/// Returns `false` when a logger was already installed (for example by a
/// previous test in the same process).
pub fn init() -> bool {
    env_logger::try_init().is_ok()
}

/// Initialize the logging system with a fallback level
///
/// `RUST_LOG` still takes precedence when it is set; otherwise `level`
/// (e.g. `"info"`, `"debug"`, `"dither_engine=trace"`) is used as the filter.
pub fn init_with_level(level: &str) -> bool {
    let env = env_logger::Env::default().default_filter_or(level);
    env_logger::Builder::from_env(env).try_init().is_ok()
}
