#![forbid(unsafe_code)]

//! JSON log output for hosts that do not install their own subscriber.
//!
//! Only compiled with the `tracing-json` feature. The library itself only
//! emits `tracing` events; installing a subscriber stays the host's call.

use std::error::Error;

use tracing_subscriber::EnvFilter;

/// Install a global JSON subscriber filtered by `filter`
/// (`EnvFilter` syntax, e.g. `"bindery_core=debug"`).
///
/// # Errors
///
/// Fails when the filter does not parse or a global subscriber is already
/// installed.
pub fn init_json_logging(filter: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_new(filter)?;
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
}
