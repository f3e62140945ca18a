//! Error types for the pub/sub registry.

use std::time::Duration;
use thiserror::Error;

/// Main error type for registry operations.
///
/// The registry favors defensive idempotence over strictness: unknown
/// handles, never-subscribed events, and missing subscriber tables all
/// resolve to silent no-ops. Only waiting on delivery can fail.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("deliveries did not settle within {timeout:?}")]
    SettleTimeout { timeout: Duration },

    #[error("dispatcher terminated")]
    Terminated,
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
