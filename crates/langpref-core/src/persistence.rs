//! Cookie persistence.
//!
//! [`CookieAdapter`] is the raw key/value layer over a [`CookieJar`];
//! [`PreferenceStore`] binds it to one key, the active scope and a TTL.
//! Neither validates values; that is the resolver's job.

use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use langpref_types::{DomainScope, PersistenceError};
use tracing::{debug, warn};

use crate::ports::CookieJar;

/// Default cookie lifetime.
pub const DEFAULT_TTL_DAYS: u32 = 365;

/// A cookie write as the browser receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub scope: DomainScope,
    pub path: String,
    pub expires: DateTime<Utc>,
}

impl SetCookie {
    pub fn new(name: &str, value: &str, scope: &DomainScope, ttl_days: u32) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            scope: scope.clone(),
            path: "/".to_string(),
            expires: Utc::now() + Duration::days(i64::from(ttl_days)),
        }
    }

    /// Removal record: empty value, expiry at the epoch.
    pub fn removal(name: &str, scope: &DomainScope) -> Self {
        Self {
            name: name.to_string(),
            value: String::new(),
            scope: scope.clone(),
            path: "/".to_string(),
            expires: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn is_removal(&self) -> bool {
        self.expires <= Utc::now()
    }

    /// `document.cookie` assignment string.
    ///
    /// `name=value; expires=<http-date>; path=/; [domain=<d>; ]SameSite=Lax`
    pub fn to_cookie_string(&self) -> String {
        let mut out = format!(
            "{}={}; expires={}; path={}",
            self.name,
            self.value,
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
            self.path
        );
        if let Some(domain) = self.scope.attribute() {
            out.push_str("; domain=");
            out.push_str(domain);
        }
        out.push_str("; SameSite=Lax");
        out
    }
}

/// Values for `name` in a `Cookie:` / `document.cookie` string, in order.
///
/// ```
/// use langpref_core::persistence::parse_cookie_header;
///
/// let header = "a=1; lang=ru; b=2; lang=kk-kz";
/// assert_eq!(parse_cookie_header(header, "lang"), vec!["ru", "kk-kz"]);
/// ```
pub fn parse_cookie_header(header: &str, name: &str) -> Vec<String> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .collect()
}

/// Raw key/value access to the cookie store.
#[derive(Clone)]
pub struct CookieAdapter {
    jar: Rc<dyn CookieJar>,
}

impl CookieAdapter {
    pub fn new(jar: Rc<dyn CookieJar>) -> Self {
        Self { jar }
    }

    /// First non-empty visible value.
    pub fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.read_all(key)?.into_iter().next())
    }

    /// Every non-empty visible value, one per stored copy.
    pub fn read_all(&self, key: &str) -> Result<Vec<String>, PersistenceError> {
        let mut values = self.jar.values(key)?;
        values.retain(|v| !v.is_empty());
        Ok(values)
    }

    pub fn write(
        &self,
        key: &str,
        value: &str,
        scope: &DomainScope,
        ttl_days: u32,
    ) -> Result<(), PersistenceError> {
        let cookie = SetCookie::new(key, value, scope, ttl_days);
        debug!(cookie = %key, scope = %scope, "Writing cookie");
        self.jar.store(&cookie)
    }

    /// Remove under `scope` and under host-only, since older writers may
    /// have stored an unscoped copy. Both are attempted; the first error is
    /// returned.
    pub fn delete(&self, key: &str, scope: &DomainScope) -> Result<(), PersistenceError> {
        let scoped = self.remove(key, scope);
        let unscoped = if scope.is_host_only() {
            Ok(())
        } else {
            self.remove(key, &DomainScope::HostOnly)
        };
        scoped.and(unscoped)
    }

    /// Remove under exactly one scope.
    pub fn remove(&self, key: &str, scope: &DomainScope) -> Result<(), PersistenceError> {
        self.jar.store(&SetCookie::removal(key, scope))
    }
}

/// The preference cookie bound to its key, active scope and lifetime.
#[derive(Clone)]
pub struct PreferenceStore {
    adapter: CookieAdapter,
    key: String,
    scope: DomainScope,
    ttl_days: u32,
}

impl PreferenceStore {
    pub fn new(adapter: CookieAdapter, key: &str, scope: DomainScope, ttl_days: u32) -> Self {
        Self { adapter, key: key.to_string(), scope, ttl_days }
    }

    pub fn adapter(&self) -> &CookieAdapter {
        &self.adapter
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn scope(&self) -> &DomainScope {
        &self.scope
    }

    pub fn ttl_days(&self) -> u32 {
        self.ttl_days
    }

    /// Current value; store failures read as "absent".
    pub fn read(&self) -> Option<String> {
        match self.adapter.read(&self.key) {
            Ok(value) => value,
            Err(e) => {
                warn!(cookie = %self.key, error = %e, "Cookie read failed");
                None
            },
        }
    }

    pub fn write(&self, value: &str) -> Result<(), PersistenceError> {
        self.adapter.write(&self.key, value, &self.scope, self.ttl_days)
    }

    /// Write once, read back once. No retries.
    pub fn write_verified(&self, value: &str) -> Result<(), PersistenceError> {
        self.write(value)?;
        let found = self.adapter.read(&self.key)?;
        if found.as_deref() == Some(value) {
            Ok(())
        } else {
            Err(PersistenceError::NotVerified {
                name: self.key.clone(),
                expected: value.to_string(),
                found,
            })
        }
    }

    pub fn delete(&self) -> Result<(), PersistenceError> {
        self.adapter.delete(&self.key, &self.scope)
    }
}
