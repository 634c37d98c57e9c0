// crates/reconcile-cli/src/logging.rs
// ============================================================================
// Module: CLI Logging
// Description: tracing-subscriber setup for the reconcile binary.
// Purpose: Route engine events to stderr at the configured level.
// Dependencies: tracing-subscriber
// ============================================================================

//! ## Overview
//! `RUST_LOG` takes precedence; otherwise the level from `[logging]` applies.
//! Events go to stderr so stdout carries only command output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Setup
// ============================================================================

/// Builds the event filter from `RUST_LOG` or the configured level.
pub(crate) fn build_env_filter(level: &str) -> Result<EnvFilter, String> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level.trim()).map_err(|err| format!("invalid log level '{level}': {err}"))
}

/// Installs the global subscriber.
pub(crate) fn init_logging(level: &str) -> Result<(), String> {
    let filter = build_env_filter(level)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| format!("failed to install log subscriber: {err}"))
}
