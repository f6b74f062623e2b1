//! Diagnostic logging for the engine, powered by `tracing-subscriber`.
//!
//! Engine decisions are emitted as `tracing` events: `debug` for pass
//! boundaries and discoveries, `trace` for every skip, `warn` for
//! non-determinism. Logs go to stderr so they never mix with reporter output.

use tracing_subscriber::EnvFilter;

use crate::{err_msg, SubcaseError};

/// Builds the filter from `RUST_LOG` when set, otherwise from `level`.
pub fn build_env_filter(level: &str) -> Result<EnvFilter, SubcaseError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| err_msg!(Config, "invalid log filter '{}': {}", level, e))
}

/// Installs the global subscriber. Calling it again is a no-op.
pub fn init(level: &str) -> Result<(), SubcaseError> {
    let filter = build_env_filter(level)?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}
