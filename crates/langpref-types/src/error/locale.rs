//! Locale parsing and support errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while turning raw input into a supported locale.
///
/// Resolution never surfaces these to the end user; they are used to
/// reject explicit changes and broadcasts.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum LocaleError {
    /// Input was empty or whitespace
    #[error("Locale is empty")]
    Empty,

    /// Input is not a syntactically valid language tag
    #[error("Malformed locale: {input}")]
    Malformed {
        /// Raw input as received
        input: String,
    },

    /// Input is well-formed but not part of the supported set
    #[error("Unsupported locale: {code}")]
    Unsupported {
        /// Normalized code
        code: String,
    },

    /// Supported set would be empty
    #[error("No supported locales configured")]
    NoSupportedLocales,
}
