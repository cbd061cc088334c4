//! Cookie store errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading or writing the preference cookie.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum PersistenceError {
    /// Store is missing, disabled or threw (no document, cookies off, quota)
    #[error("Cookie store unavailable: {message}")]
    Unavailable {
        /// Description of the underlying failure
        message: String,
    },

    /// Store refused the cookie (for example a domain the host cannot set)
    #[error("Cookie {name} rejected for domain {domain}: {reason}")]
    Rejected {
        /// Cookie name
        name: String,
        /// Domain attribute that was attempted
        domain: String,
        /// Why the store refused it
        reason: String,
    },

    /// Read-back after a write did not return the written value
    #[error("Write of {name} not visible after commit: expected {expected}, found {found:?}")]
    NotVerified {
        /// Cookie name
        name: String,
        /// Value that was written
        expected: String,
        /// Value that was read back
        found: Option<String>,
    },
}

impl PersistenceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }
}
