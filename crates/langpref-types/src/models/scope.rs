//! Cookie domain scope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain attribute under which the preference cookie is written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "domain", rename_all = "snake_case")]
pub enum DomainScope {
    /// No `domain` attribute: visible to the exact host only
    HostOnly,
    /// Explicit `domain` attribute, e.g. `.openedx.example.com`
    Domain(String),
}

impl DomainScope {
    pub fn domain(value: impl Into<String>) -> Self {
        Self::Domain(value.into())
    }

    /// Value for the cookie `domain` attribute, if any.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::HostOnly => None,
            Self::Domain(d) => Some(d.as_str()),
        }
    }

    pub fn is_host_only(&self) -> bool {
        matches!(self, Self::HostOnly)
    }
}

impl fmt::Display for DomainScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostOnly => f.write_str("host-only"),
            Self::Domain(d) => f.write_str(d),
        }
    }
}
