//! Command-line front end for the `snmpbug` daemon.
//!
//! This module is only available with the `cli` feature.

pub mod args;
pub mod file;

pub use args::Args;
pub use file::FileConfig;

use tracing_subscriber::EnvFilter;

/// Install the stderr log sink.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
