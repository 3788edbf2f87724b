//! Tracing setup for the server binary.
//!
//! The subscriber is installed once, before configuration is read, so
//! startup problems are logged too. The level from configuration arrives
//! later and is applied through a reload handle instead of reinstalling
//! the subscriber.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Installs the global subscriber.
///
/// Starts at `info`; a `RUST_LOG` directive set in the environment wins
/// over that default. Calling this twice is harmless, the second install
/// attempt is discarded.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(filter);
    let _ = FILTER_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

/// Swaps the active filter for `level` at runtime.
///
/// Does nothing when [`init_tracing`] has not run yet.
pub fn apply_logging_level(level: &str) {
    if let Some(handle) = FILTER_HANDLE.get() {
        let _ = handle.modify(|filter| *filter = EnvFilter::new(level));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_changes_are_safe_in_any_order() {
        // Before init the reload handle is absent and the call is a no-op
        apply_logging_level("debug");

        init_tracing();
        init_tracing();
        apply_logging_level("warn");
    }
}
