#![allow(unused_crate_dependencies)]
#![allow(clippy::tests_outside_test_module, reason = "integration tests live in tests/ dir")]
#![allow(clippy::unwrap_used, reason = "integration test — panics are the assertion mechanism")]

use std::cell::RefCell;
use std::rc::Rc;

use langpref_core::memory::{FixedClientLocale, LocalSignalBus, ManualScheduler, MemoryCookieJar, StaticAddress};
use langpref_core::types::{ConsumerState, DomainScope, PreferenceConfig, PreferenceSource};
use langpref_core::{CookieAdapter, EnginePorts, PreferenceEngine};

const KEY: &str = "openedx-language-preference";

/// One rendered page: its own address and bus, sharing the browser's jar.
struct Page {
    engine: PreferenceEngine,
    address: StaticAddress,
    bus: LocalSignalBus,
    scheduler: ManualScheduler,
}

fn open(jar: &MemoryCookieJar, href: &str, client: Option<&str>, config: PreferenceConfig) -> Page {
    let address = StaticAddress::new(href);
    let bus = LocalSignalBus::new();
    let host = url::Url::parse(href).unwrap().host_str().unwrap().to_string();
    let ports = EnginePorts {
        jar: Rc::new(jar.for_host(&host)),
        address: Rc::new(address.clone()),
        client: Rc::new(FixedClientLocale(client.map(str::to_string))),
        bus: Rc::new(bus.clone()),
    };
    let engine = PreferenceEngine::new(config, ports).unwrap();
    Page { engine, address, bus, scheduler: ManualScheduler::new() }
}

fn config() -> PreferenceConfig {
    PreferenceConfig::from_json(
        r#"{
            "supported_locales": ["en", "ru", "kk-kz"],
            "org_markers": ["openedx"],
            "legacy_scopes": [".example.com"]
        }"#,
    )
    .unwrap()
}

#[test]
fn test_query_parameter_survives_reload_without_it() {
    let jar = MemoryCookieJar::new("apps.openedx.example.com");

    let first = open(&jar, "https://apps.openedx.example.com/dashboard?locale=ru", Some("en-US"), config());
    let resolution = first.engine.initialize();
    assert_eq!(resolution.locale.as_str(), "ru");
    assert_eq!(resolution.source, PreferenceSource::QueryParameter);
    assert!(resolution.persisted);

    let reload = open(&jar, "https://apps.openedx.example.com/dashboard", Some("en-US"), config());
    let resolution = reload.engine.initialize();
    assert_eq!(resolution.locale.as_str(), "ru");
    assert_eq!(resolution.source, PreferenceSource::Persisted);
}

#[test]
fn test_preference_is_shared_across_organization_subdomains() {
    let jar = MemoryCookieJar::new("apps.openedx.example.com");
    let apps = open(&jar, "https://apps.openedx.example.com/?locale=kk-kz", None, config());
    apps.engine.initialize();

    let studio = open(&jar, "https://studio.openedx.example.com/home", Some("ru"), config());
    let resolution = studio.engine.initialize();
    assert_eq!(resolution.locale.as_str(), "kk-kz");
    assert_eq!(resolution.source, PreferenceSource::Persisted);

    let elsewhere = open(&jar, "https://www.example.org/", None, config());
    assert_eq!(elsewhere.engine.initialize().source, PreferenceSource::Default);
}

#[test]
fn test_initialize_collapses_drifted_copies() {
    let jar = MemoryCookieJar::new("apps.openedx.example.com");
    let adapter = CookieAdapter::new(Rc::new(jar.clone()));
    adapter.write(KEY, "ru", &DomainScope::HostOnly, 365).unwrap();
    adapter.write(KEY, "en", &DomainScope::domain(".example.com"), 365).unwrap();
    adapter.write(KEY, "kk-kz", &DomainScope::domain("openedx.example.com"), 365).unwrap();
    assert_eq!(jar.copies(KEY).len(), 3);

    let page = open(&jar, "https://apps.openedx.example.com/", None, config());
    let resolution = page.engine.initialize();

    assert_eq!(resolution.locale.as_str(), "ru");
    assert_eq!(
        jar.copies(KEY),
        vec![(DomainScope::domain(".openedx.example.com"), "ru".to_string())]
    );
}

#[test]
fn test_resolve_twice_is_stable_with_one_write() {
    let jar = MemoryCookieJar::new("apps.openedx.example.com");
    let page = open(&jar, "https://apps.openedx.example.com/", Some("ru_RU.UTF-8"), config());
    let resolver = page.engine.resolver();
    let supported = page.engine.supported().clone();

    let first = resolver.resolve(&supported);
    let second = resolver.resolve(&supported);
    assert_eq!(first.locale, second.locale);
    assert_eq!(first.locale.as_str(), "ru");
    assert_eq!(jar.write_count(), 1);
}

#[test]
fn test_change_reaches_early_consumers_once_and_late_ones_by_poll() {
    let jar = MemoryCookieJar::new("apps.openedx.example.com");
    let page = open(&jar, "https://apps.openedx.example.com/", None, config());
    page.engine.initialize();
    page.engine.start_polling(&page.scheduler).unwrap();

    // Header widget attached before the change
    let header = page.engine.new_consumer().unwrap();
    let header_seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&header_seen);
    header.on_change(move |locale| sink.borrow_mut().push(locale.to_string()));
    header.start_polling(&page.scheduler, page.engine.poll_interval());

    // Footer rendered with the old locale but wires up after the broadcast
    let footer_baseline = page.engine.current_locale();

    let outcome = page.engine.change_locale("kk-kz").unwrap();
    assert!(outcome.persisted);
    assert_eq!(*header_seen.borrow(), vec!["kk-kz"]);
    assert_eq!(page.engine.state(), ConsumerState::Resolved(outcome.locale.clone()));

    let footer = langpref_core::LocaleSubscriber::new(
        Rc::new(page.bus.clone()),
        page.engine.store().clone(),
        page.engine.supported().clone(),
        footer_baseline,
    );
    let footer_seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&footer_seen);
    footer.on_change(move |locale| sink.borrow_mut().push(locale.to_string()));
    footer.start_polling(&page.scheduler, page.engine.poll_interval());
    assert!(footer_seen.borrow().is_empty());

    page.scheduler.advance(page.engine.poll_interval());
    assert_eq!(*footer_seen.borrow(), vec!["kk-kz"]);
    assert_eq!(*header_seen.borrow(), vec!["kk-kz"]);
}

#[test]
fn test_other_tab_change_arrives_by_poll() {
    let jar = MemoryCookieJar::new("apps.openedx.example.com");
    let apps = open(&jar, "https://apps.openedx.example.com/", None, config());
    apps.engine.initialize();
    apps.engine.start_polling(&apps.scheduler).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    apps.engine.on_change(move |locale| sink.borrow_mut().push(locale.to_string())).unwrap();

    let studio = open(&jar, "https://studio.openedx.example.com/", None, config());
    studio.engine.initialize();
    studio.engine.change_locale("ru").unwrap();
    // Different page, different bus
    assert!(seen.borrow().is_empty());
    assert_eq!(apps.bus.published(), 0);

    apps.scheduler.advance(apps.engine.poll_interval());
    assert_eq!(*seen.borrow(), vec!["ru"]);
    assert_eq!(apps.engine.current_locale().unwrap().as_str(), "ru");

    apps.engine.teardown();
    assert_eq!(apps.scheduler.active_tasks(), 0);
}

#[test]
fn test_disabled_cookies_degrade_gracefully() {
    let jar = MemoryCookieJar::new("apps.openedx.example.com");
    jar.set_disabled(true);

    let page = open(&jar, "https://apps.openedx.example.com/?locale=ru", None, config());
    let resolution = page.engine.initialize();
    assert_eq!(resolution.locale.as_str(), "ru");
    assert!(!resolution.persisted);

    let outcome = page.engine.change_locale("kk-kz").unwrap();
    assert!(!outcome.persisted);
    assert_eq!(page.engine.current_locale().unwrap().as_str(), "kk-kz");
}

#[test]
fn test_localhost_ignores_domain_override() {
    let jar = MemoryCookieJar::new("localhost");
    let mut config = config();
    config.cookie_domain = Some("localhost".to_string());

    let page = open(&jar, "http://localhost:18000/?locale=ru", None, config);
    assert_eq!(page.engine.scope(), &DomainScope::HostOnly);
    page.engine.initialize();
    assert_eq!(jar.copies(KEY), vec![(DomainScope::HostOnly, "ru".to_string())]);
}

#[test]
fn test_single_label_host_persists_host_only_despite_override() {
    let jar = MemoryCookieJar::new("intranet");
    let mut config = config();
    config.cookie_domain = Some(".example.com".to_string());
    config.legacy_scopes.clear();

    let page = open(&jar, "http://intranet/?locale=ru", None, config);
    assert_eq!(page.engine.scope(), &DomainScope::HostOnly);
    let resolution = page.engine.initialize();
    assert!(resolution.persisted);
    assert_eq!(jar.copies(KEY), vec![(DomainScope::HostOnly, "ru".to_string())]);
}

#[test]
fn test_address_change_does_not_override_persisted_choice() {
    let jar = MemoryCookieJar::new("apps.openedx.example.com");
    let page = open(&jar, "https://apps.openedx.example.com/", None, config());
    page.engine.initialize();
    page.engine.change_locale("ru").unwrap();

    page.address.set_href("https://apps.openedx.example.com/?locale=en");
    assert_eq!(page.engine.initialize().locale.as_str(), "ru");
}
