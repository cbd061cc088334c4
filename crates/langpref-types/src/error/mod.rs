//! Typed error definitions for langpref.
//!
//! One error enum per concern. Core wraps them in its own `EngineError`.
//! All errors are designed to be:
//!
//! - **Serializable** so they can be handed to JavaScript callers
//! - **Displayable** for logging via Display trait
//! - **Matchable** for error handling logic via enum variants

mod config;
mod locale;
mod persistence;

pub use config::ConfigError;
pub use locale::LocaleError;
pub use persistence::PersistenceError;
