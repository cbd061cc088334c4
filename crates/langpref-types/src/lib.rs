//! # langpref Types
//!
//! Core types, configuration and error definitions for the language
//! preference engine.
//!
//! - **`error`** - Typed error hierarchy for locales, persistence and configuration
//! - **`models`** - Domain models (LocaleCode, DomainScope, SyncEvent, PreferenceConfig)
//!
//! ## Architecture Role
//!
//! `langpref-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!              langpref-types (this crate)
//!                      │
//!                      ▼
//!               langpref-core
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//!   langpref-leptos           langpref-cli
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde so they can cross the wasm boundary
//! - **Clone** for cheap sharing between consumers
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{ConfigError, LocaleError, PersistenceError};

// Re-export core model types
pub use models::{
    ConsumerState, DomainScope, LocaleCode, PreferenceConfig, PreferenceRecord, PreferenceSource,
    SupportedLocales, SyncEvent,
};
