//! Diagnostic logging setup.
//!
//! Progress output for users goes through [`output`](crate::output) on
//! stdout. Diagnostics (per-window scores, search winners, per-image
//! failures) are `tracing` events written to stderr, filtered by `-v` count
//! and `RUST_LOG`.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Level enabled by `-v` repetitions: none → warn, `-v` → info,
/// `-vv` → debug, `-vvv` and up → trace.
pub fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn create_filter(verbose: u8) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(level_for(verbose).into())
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(verbose: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(create_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
}
