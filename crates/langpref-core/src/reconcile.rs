//! Duplicate-scope cleanup.
//!
//! Earlier deployments may have written the preference under a different
//! `domain` attribute. The browser then sends several copies and which one
//! wins is up to cookie ordering. The reconciler removes the key under every
//! scope it could have been written with and puts the winning value back
//! once under the current scope.

use langpref_types::{DomainScope, PersistenceError};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::persistence::PreferenceStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// Value rewritten under the current scope, if one existed
    pub restored: Option<String>,
    /// Visible copies beyond the first
    pub duplicates_seen: usize,
    /// Removal writes accepted by the store
    pub deletions: usize,
    /// Removal writes the store refused (foreign or malformed legacy scopes)
    pub failed_deletions: usize,
}

pub struct Reconciler {
    store: PreferenceStore,
    candidates: Vec<DomainScope>,
}

impl Reconciler {
    pub fn new(store: &PreferenceStore, candidates: Vec<DomainScope>) -> Self {
        Self { store: store.clone(), candidates }
    }

    pub fn candidates(&self) -> &[DomainScope] {
        &self.candidates
    }

    /// Collapse every visible copy into one under the current scope.
    ///
    /// Fails only when the store cannot be read or the final rewrite is
    /// refused; individual removal failures are counted and skipped.
    pub fn reconcile(&self) -> Result<ReconcileOutcome, PersistenceError> {
        let key = self.store.key();
        let adapter = self.store.adapter();

        let copies = adapter.read_all(key)?;
        let mut outcome = ReconcileOutcome {
            duplicates_seen: copies.len().saturating_sub(1),
            ..ReconcileOutcome::default()
        };

        for scope in &self.candidates {
            match adapter.remove(key, scope) {
                Ok(()) => outcome.deletions += 1,
                Err(e) => {
                    debug!(cookie = %key, scope = %scope, error = %e, "Skipping cleanup scope");
                    outcome.failed_deletions += 1;
                },
            }
        }

        let Some(value) = copies.into_iter().next() else {
            debug!(cookie = %key, "Nothing to reconcile");
            return Ok(outcome);
        };

        if let Err(e) = self.store.write(&value) {
            warn!(cookie = %key, value = %value, error = %e, "Failed to restore preference after cleanup");
            return Err(e);
        }

        if outcome.duplicates_seen > 0 {
            info!(
                cookie = %key,
                value = %value,
                scope = %self.store.scope(),
                duplicates = outcome.duplicates_seen,
                "Collapsed duplicate preference cookies"
            );
        }
        outcome.restored = Some(value);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::memory::MemoryCookieJar;
    use crate::persistence::CookieAdapter;
    use crate::scope::ScopeResolver;

    const HOST: &str = "apps.openedx.example.com";
    const KEY: &str = "openedx-language-preference";

    fn setup(jar: &MemoryCookieJar, legacy: Vec<String>) -> (PreferenceStore, Reconciler) {
        let scopes = ScopeResolver::new(None, vec!["openedx".to_string()], legacy);
        let store = PreferenceStore::new(
            CookieAdapter::new(Rc::new(jar.clone())),
            KEY,
            scopes.resolve(HOST),
            365,
        );
        let reconciler = Reconciler::new(&store, scopes.candidates(HOST));
        (store, reconciler)
    }

    #[test]
    fn test_collapses_copies_to_one_under_current_scope() {
        let jar = MemoryCookieJar::new(HOST);
        let adapter = CookieAdapter::new(Rc::new(jar.clone()));
        adapter.write(KEY, "ru", &DomainScope::HostOnly, 365).unwrap();
        adapter.write(KEY, "en", &DomainScope::domain(".example.com"), 365).unwrap();
        adapter.write(KEY, "kk-kz", &DomainScope::domain("apps.openedx.example.com"), 365).unwrap();

        let (store, reconciler) = setup(&jar, vec![]);
        let outcome = reconciler.reconcile().unwrap();

        assert_eq!(outcome.restored.as_deref(), Some("ru"));
        assert_eq!(outcome.duplicates_seen, 2);
        assert_eq!(
            jar.copies(KEY),
            vec![(DomainScope::domain(".openedx.example.com"), "ru".to_string())]
        );
        assert_eq!(store.read().as_deref(), Some("ru"));
    }

    #[test]
    fn test_no_value_means_no_write() {
        let jar = MemoryCookieJar::new(HOST);
        let (_, reconciler) = setup(&jar, vec![]);
        let outcome = reconciler.reconcile().unwrap();
        assert!(outcome.restored.is_none());
        assert_eq!(jar.write_count(), 0);
        assert!(jar.copies(KEY).is_empty());
    }

    #[test]
    fn test_is_idempotent() {
        let jar = MemoryCookieJar::new(HOST);
        let adapter = CookieAdapter::new(Rc::new(jar.clone()));
        adapter.write(KEY, "kk-kz", &DomainScope::HostOnly, 365).unwrap();

        let (_, reconciler) = setup(&jar, vec![]);
        reconciler.reconcile().unwrap();
        let after_first = jar.copies(KEY);
        let second = reconciler.reconcile().unwrap();

        assert_eq!(jar.copies(KEY), after_first);
        assert_eq!(second.duplicates_seen, 0);
        assert_eq!(second.restored.as_deref(), Some("kk-kz"));
    }

    #[test]
    fn test_foreign_legacy_scope_is_tolerated() {
        let jar = MemoryCookieJar::new(HOST);
        let adapter = CookieAdapter::new(Rc::new(jar.clone()));
        adapter.write(KEY, "en", &DomainScope::HostOnly, 365).unwrap();

        let (_, reconciler) = setup(&jar, vec![".other-org.net".to_string()]);
        let outcome = reconciler.reconcile().unwrap();
        assert_eq!(outcome.failed_deletions, 1);
        assert_eq!(outcome.restored.as_deref(), Some("en"));
    }

    #[test]
    fn test_unavailable_store_is_an_error() {
        let jar = MemoryCookieJar::new(HOST);
        jar.set_disabled(true);
        let (_, reconciler) = setup(&jar, vec![]);
        assert!(matches!(reconciler.reconcile(), Err(PersistenceError::Unavailable { .. })));
    }
}
