//! Unified error types for langpref Core.

use langpref_types::{ConfigError, LocaleError, PersistenceError};
use serde::Serialize;
use thiserror::Error;

/// Main error type for engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    /// Locale was empty, malformed or not supported.
    #[error("Locale error: {0}")]
    Locale(#[from] LocaleError),

    /// Cookie store read/write failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Operation requires `initialize()` to have run.
    #[error("Engine not initialized")]
    NotInitialized,
}

impl Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
