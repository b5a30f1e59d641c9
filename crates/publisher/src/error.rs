//! Publisher error types.
//!
//! Only configuration and signing failures surface as errors; transport
//! failures are absorbed into per-relay attempt results and an aggregate
//! shortfall is a normal unaccepted outcome, not an error.

use thiserror::Error;

/// Publisher error type
#[derive(Error, Debug)]
pub enum PublishError {
    /// Missing or unusable configuration (no relays, no signing key)
    #[error("configuration error: {0}")]
    Config(String),

    /// Event could not be signed
    #[error("signing error: {0}")]
    Signing(#[from] relaypub_core::EventError),

    /// Configured key material could not be parsed
    #[error("key error: {0}")]
    Key(#[from] relaypub_core::KeyError),
}

/// Publisher result type
pub type Result<T> = std::result::Result<T, PublishError>;
