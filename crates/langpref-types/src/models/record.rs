//! Persisted record, sync notifications and per-consumer state.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::locale::LocaleCode;
use super::scope::DomainScope;

/// The single logical preference cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub key: String,
    pub value: LocaleCode,
    pub domain_scope: DomainScope,
}

/// Where a resolved locale came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceSource {
    /// Previously saved cookie
    Persisted,
    /// `?locale=` style override on the current address
    QueryParameter,
    /// Platform-supplied client locale (navigator.language)
    ClientSignal,
    /// Configured fallback
    Default,
}

impl PreferenceSource {
    /// Whether a locale from this source is written back to the cookie.
    pub fn is_backfilled(self) -> bool {
        matches!(self, Self::QueryParameter | Self::ClientSignal)
    }
}

impl fmt::Display for PreferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Persisted => "persisted",
            Self::QueryParameter => "query-parameter",
            Self::ClientSignal => "client-signal",
            Self::Default => "default",
        };
        f.write_str(label)
    }
}

/// In-page locale change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub locale: LocaleCode,
}

impl SyncEvent {
    pub fn new(locale: LocaleCode) -> Self {
        Self { locale }
    }
}

/// Lifecycle of one locale consumer.
///
/// `Uninitialized -> Resolved(l)` on first resolution, then
/// `Resolved(l1) -> Resolved(l2)` only when `l2 != l1`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConsumerState {
    #[default]
    Uninitialized,
    Resolved(LocaleCode),
}

impl ConsumerState {
    pub fn locale(&self) -> Option<&LocaleCode> {
        match self {
            Self::Uninitialized => None,
            Self::Resolved(l) => Some(l),
        }
    }

    /// Apply a resolution or change notification.
    ///
    /// Returns `true` when the state actually moved.
    pub fn accept(&mut self, locale: &LocaleCode) -> bool {
        if self.locale() == Some(locale) {
            return false;
        }
        *self = Self::Resolved(locale.clone());
        true
    }
}
