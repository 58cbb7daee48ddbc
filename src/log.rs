//! Logging utilities

use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

/// Noisy dependencies that only get to report errors
const QUIET: [&str; 3] = ["async_std=error", "async_io=error", "polling=error"];

pub(crate) fn parse_log_level() {
    let filter = QUIET
        .iter()
        .filter_map(|d| d.parse().ok())
        .fold(
            EnvFilter::try_from_env("AUDIOCONF_LOG")
                .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::INFO.into())),
            |f, d| f.add_directive(d),
        );

    // stdout carries the rendered pages, keep the log out of it
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    info!("Initialised logger: welcome to audioconf!");
}

/// Create an oops (a fatal crash) with an associated error message
pub(crate) fn oops<S: Into<String>>(msg: S, code: u16) -> ! {
    error!("{}", msg.into());
    std::process::exit(code.into());
}
