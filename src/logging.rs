//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::config::LoggingConfig;

/// Installs the global subscriber.
///
/// Events go to stderr so stdout stays free for command output. `RUST_LOG`
/// wins over `cfg.level` when set. Calling this twice is a no-op.
pub fn init(cfg: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = Registry::default().with(filter);
    let _ = if cfg.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
}
