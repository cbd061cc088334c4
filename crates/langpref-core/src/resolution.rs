//! Precedence chain: cookie → query parameter → client locale → default.

use std::rc::Rc;

use langpref_types::{LocaleCode, PreferenceSource, SupportedLocales};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::persistence::PreferenceStore;
use crate::ports::{AddressReader, ClientLocale};

/// Outcome of one [`PreferenceResolver::resolve`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub locale: LocaleCode,
    pub source: PreferenceSource,
    /// Whether this call wrote the locale back and read it back intact.
    pub persisted: bool,
}

pub struct PreferenceResolver {
    store: PreferenceStore,
    address: Rc<dyn AddressReader>,
    client: Rc<dyn ClientLocale>,
    query_param: String,
}

impl PreferenceResolver {
    pub fn new(
        store: PreferenceStore,
        address: Rc<dyn AddressReader>,
        client: Rc<dyn ClientLocale>,
        query_param: &str,
    ) -> Self {
        Self { store, address, client, query_param: query_param.to_string() }
    }

    /// Pick the effective locale. Only the query and client sources are
    /// written back; a failed write is logged and left for the next call.
    pub fn resolve(&self, supported: &SupportedLocales) -> Resolution {
        if let Some(raw) = self.store.read() {
            match supported.lookup(&raw) {
                Some(locale) => {
                    debug!(locale = %locale, "Using persisted locale");
                    return Resolution { locale, source: PreferenceSource::Persisted, persisted: false };
                },
                None => debug!(value = %raw, "Ignoring unsupported persisted locale"),
            }
        }

        if let Some(raw) = self.address.query_param(&self.query_param) {
            match supported.lookup(&raw) {
                Some(locale) => return self.backfill(locale, PreferenceSource::QueryParameter),
                None => debug!(param = %self.query_param, value = %raw, "Ignoring unsupported query locale"),
            }
        }

        if let Some(raw) = self.client.client_locale() {
            match supported.negotiate(&raw) {
                Some(locale) => return self.backfill(locale, PreferenceSource::ClientSignal),
                None => debug!(value = %raw, "No supported match for client locale"),
            }
        }

        let locale = supported.default_locale().clone();
        debug!(locale = %locale, "Falling back to default locale");
        Resolution { locale, source: PreferenceSource::Default, persisted: false }
    }

    fn backfill(&self, locale: LocaleCode, source: PreferenceSource) -> Resolution {
        let persisted = match self.store.write_verified(locale.as_str()) {
            Ok(()) => {
                info!(locale = %locale, source = %source, "Persisted resolved locale");
                true
            },
            Err(e) => {
                warn!(locale = %locale, source = %source, error = %e, "Could not persist resolved locale");
                false
            },
        };
        Resolution { locale, source, persisted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FixedClientLocale, MemoryCookieJar, StaticAddress};
    use crate::persistence::{CookieAdapter, SetCookie};
    use crate::ports::CookieJar;
    use langpref_types::DomainScope;

    const HOST: &str = "apps.openedx.example.com";
    const KEY: &str = "openedx-language-preference";

    struct Fixture {
        jar: MemoryCookieJar,
        address: StaticAddress,
        resolver: PreferenceResolver,
    }

    fn fixture(href: &str, client: Option<&str>) -> Fixture {
        let jar = MemoryCookieJar::new(HOST);
        let address = StaticAddress::new(href);
        let store = PreferenceStore::new(
            CookieAdapter::new(Rc::new(jar.clone())),
            KEY,
            DomainScope::domain(".openedx.example.com"),
            365,
        );
        let resolver = PreferenceResolver::new(
            store,
            Rc::new(address.clone()),
            Rc::new(FixedClientLocale(client.map(str::to_string))),
            "locale",
        );
        Fixture { jar, address, resolver }
    }

    fn supported() -> SupportedLocales {
        SupportedLocales::new(["en", "ru", "kk-kz"]).unwrap()
    }

    #[test]
    fn test_query_parameter_is_persisted_and_sticks() {
        let f = fixture("https://apps.openedx.example.com/?locale=ru", Some("en-US"));
        let first = f.resolver.resolve(&supported());
        assert_eq!(first.locale.as_str(), "ru");
        assert_eq!(first.source, PreferenceSource::QueryParameter);
        assert!(first.persisted);

        f.address.set_href("https://apps.openedx.example.com/");
        let second = f.resolver.resolve(&supported());
        assert_eq!(second.locale.as_str(), "ru");
        assert_eq!(second.source, PreferenceSource::Persisted);
    }

    #[test]
    fn test_persisted_beats_query() {
        let f = fixture("https://apps.openedx.example.com/?locale=ru", None);
        f.jar
            .store(&SetCookie::new(KEY, "kk_KZ", &DomainScope::HostOnly, 1))
            .unwrap();
        let resolved = f.resolver.resolve(&supported());
        assert_eq!(resolved.locale.as_str(), "kk-kz");
        assert_eq!(resolved.source, PreferenceSource::Persisted);
    }

    #[test]
    fn test_client_locale_matches_on_base_subtag() {
        let f = fixture("https://apps.openedx.example.com/", Some("ru-RU"));
        let resolved = f.resolver.resolve(&supported());
        assert_eq!(resolved.locale.as_str(), "ru");
        assert_eq!(resolved.source, PreferenceSource::ClientSignal);

        let f = fixture("https://apps.openedx.example.com/", Some("kk"));
        assert_eq!(f.resolver.resolve(&supported()).locale.as_str(), "kk-kz");
    }

    #[test]
    fn test_default_is_not_persisted() {
        let f = fixture("https://apps.openedx.example.com/?locale=fr", Some("de-DE"));
        let resolved = f.resolver.resolve(&supported());
        assert_eq!(resolved.locale.as_str(), "en");
        assert_eq!(resolved.source, PreferenceSource::Default);
        assert_eq!(f.jar.write_count(), 0);
    }

    #[test]
    fn test_garbage_everywhere_stays_in_supported_set() {
        let f = fixture("https://apps.openedx.example.com/?locale=%00%21", Some("not a tag!!"));
        f.jar
            .store(&SetCookie::new(KEY, "<script>", &DomainScope::HostOnly, 1))
            .unwrap();
        let resolved = f.resolver.resolve(&supported());
        assert!(supported().contains(&resolved.locale));
    }

    #[test]
    fn test_resolve_twice_writes_at_most_once() {
        let f = fixture("https://apps.openedx.example.com/?locale=kk-KZ", None);
        let first = f.resolver.resolve(&supported());
        let second = f.resolver.resolve(&supported());
        assert_eq!(first.locale, second.locale);
        assert_eq!(f.jar.write_count(), 1);
    }

    #[test]
    fn test_write_failure_still_resolves() {
        let f = fixture("https://apps.openedx.example.com/?locale=ru", None);
        f.jar.set_disabled(true);
        let resolved = f.resolver.resolve(&supported());
        assert_eq!(resolved.locale.as_str(), "ru");
        assert!(!resolved.persisted);
    }
}
