//! Page-level orchestration.
//!
//! Initial load: reconcile → resolve → attach the page's own subscriber.
//! User change: validate → reconcile (moving the poll baseline with the
//! restored value) → write-then-verify → broadcast.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use langpref_types::{
    ConsumerState, DomainScope, LocaleCode, PreferenceConfig, PreferenceRecord, SupportedLocales,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::persistence::{CookieAdapter, PreferenceStore};
use crate::ports::{AddressReader, ClientLocale, CookieJar, Scheduler, SignalBus};
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::resolution::{PreferenceResolver, Resolution};
use crate::scope::ScopeResolver;
use crate::sync::{HandlerId, LocaleSubscriber};

/// Host capabilities the engine runs against.
#[derive(Clone)]
pub struct EnginePorts {
    pub jar: Rc<dyn CookieJar>,
    pub address: Rc<dyn AddressReader>,
    pub client: Rc<dyn ClientLocale>,
    pub bus: Rc<dyn SignalBus>,
}

/// Result of a user-initiated change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeOutcome {
    pub locale: LocaleCode,
    /// Whether the write was read back intact. The change is broadcast
    /// either way.
    pub persisted: bool,
}

pub struct PreferenceEngine {
    config: PreferenceConfig,
    supported: SupportedLocales,
    ports: EnginePorts,
    host: String,
    scopes: ScopeResolver,
    store: PreferenceStore,
    state: Rc<RefCell<ConsumerState>>,
    subscriber: RefCell<Option<Rc<LocaleSubscriber>>>,
}

impl PreferenceEngine {
    /// Validate `config` and bind it to the current host.
    pub fn new(config: PreferenceConfig, ports: EnginePorts) -> EngineResult<Self> {
        config.validate_config()?;
        let supported = config.supported()?;
        let host = ports.address.hostname().unwrap_or_default();
        let scopes = ScopeResolver::from_config(&config);
        let store = PreferenceStore::new(
            CookieAdapter::new(Rc::clone(&ports.jar)),
            &config.cookie_name,
            scopes.resolve(&host),
            config.ttl_days,
        );

        Ok(Self {
            config,
            supported,
            ports,
            host,
            scopes,
            store,
            state: Rc::new(RefCell::new(ConsumerState::default())),
            subscriber: RefCell::new(None),
        })
    }

    pub fn config(&self) -> &PreferenceConfig {
        &self.config
    }

    pub fn supported(&self) -> &SupportedLocales {
        &self.supported
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn scope(&self) -> &DomainScope {
        self.store.scope()
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    pub fn resolver(&self) -> PreferenceResolver {
        PreferenceResolver::new(
            self.store.clone(),
            Rc::clone(&self.ports.address),
            Rc::clone(&self.ports.client),
            &self.config.query_param,
        )
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(&self.store, self.scopes.candidates(&self.host))
    }

    /// The persisted record as the store sees it now, if it holds a
    /// supported value.
    pub fn record(&self) -> Option<PreferenceRecord> {
        let value = self.supported.lookup(&self.store.read()?)?;
        Some(PreferenceRecord {
            key: self.store.key().to_string(),
            value,
            domain_scope: self.store.scope().clone(),
        })
    }

    /// Initial load. Safe to call again; later calls re-resolve and feed
    /// the result through the existing subscriber.
    pub fn initialize(&self) -> Resolution {
        self.reconcile_logged();
        let resolution = self.resolver().resolve(&self.supported);
        info!(
            locale = %resolution.locale,
            source = %resolution.source,
            persisted = resolution.persisted,
            scope = %self.store.scope(),
            "Resolved locale"
        );

        if let Some(subscriber) = self.subscriber() {
            subscriber.accept(&resolution.locale);
            return resolution;
        }

        self.state.borrow_mut().accept(&resolution.locale);
        let subscriber = LocaleSubscriber::new(
            Rc::clone(&self.ports.bus),
            self.store.clone(),
            self.supported.clone(),
            Some(resolution.locale.clone()),
        );
        let state = Rc::clone(&self.state);
        subscriber.on_change(move |locale| {
            state.borrow_mut().accept(locale);
        });
        *self.subscriber.borrow_mut() = Some(Rc::new(subscriber));
        resolution
    }

    pub fn state(&self) -> ConsumerState {
        self.state.borrow().clone()
    }

    pub fn current_locale(&self) -> Option<LocaleCode> {
        self.state.borrow().locale().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.subscriber.borrow().is_some()
    }

    /// Register a view-layer handler on the page's subscriber.
    pub fn on_change(&self, handler: impl Fn(&LocaleCode) + 'static) -> EngineResult<HandlerId> {
        let subscriber = self.subscriber().ok_or(EngineError::NotInitialized)?;
        Ok(subscriber.on_change(handler))
    }

    pub fn remove_handler(&self, id: HandlerId) {
        if let Some(subscriber) = self.subscriber() {
            subscriber.remove_handler(id);
        }
    }

    /// User-initiated change.
    ///
    /// Rejects unsupported input before touching the cookie. A failed
    /// write is reported in the outcome; the change is still broadcast so
    /// the page stays consistent for this session.
    pub fn change_locale(&self, raw: &str) -> EngineResult<ChangeOutcome> {
        let subscriber = self.subscriber().ok_or(EngineError::NotInitialized)?;
        let locale = self.supported.require(raw)?;

        if let Some(outcome) = self.reconcile_logged() {
            let restored = outcome.restored.as_deref().and_then(|v| self.supported.lookup(v));
            if let Some(restored) = restored.filter(|r| *r != locale) {
                subscriber.set_baseline(&restored);
            }
        }

        let persisted = match self.store.write_verified(locale.as_str()) {
            Ok(()) => true,
            Err(e) => {
                warn!(locale = %locale, error = %e, "Locale change not persisted");
                false
            },
        };

        subscriber.broadcast(locale.as_str())?;
        // Covers buses that do not echo to the publisher
        subscriber.accept(&locale);

        info!(locale = %locale, persisted, "Locale change applied");
        Ok(ChangeOutcome { locale, persisted })
    }

    /// A further consumer on the same page, starting from the current
    /// locale. The caller owns it and may start its own poll loop.
    pub fn new_consumer(&self) -> EngineResult<LocaleSubscriber> {
        if !self.is_initialized() {
            return Err(EngineError::NotInitialized);
        }
        Ok(LocaleSubscriber::new(
            Rc::clone(&self.ports.bus),
            self.store.clone(),
            self.supported.clone(),
            self.current_locale(),
        ))
    }

    /// Start the page subscriber's poll loop at the configured interval.
    pub fn start_polling(&self, scheduler: &dyn Scheduler) -> EngineResult<()> {
        let subscriber = self.subscriber().ok_or(EngineError::NotInitialized)?;
        subscriber.start_polling(scheduler, self.poll_interval());
        Ok(())
    }

    pub fn stop_polling(&self) {
        if let Some(subscriber) = self.subscriber() {
            subscriber.stop_polling();
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.config.poll_interval_ms))
    }

    /// Page teardown: release the subscriber and its poll loop. The last
    /// resolved locale stays readable.
    pub fn teardown(&self) {
        let subscriber = self.subscriber.borrow_mut().take();
        if let Some(subscriber) = subscriber {
            subscriber.stop();
            debug!("Preference engine torn down");
        }
    }

    fn subscriber(&self) -> Option<Rc<LocaleSubscriber>> {
        self.subscriber.borrow().clone()
    }

    fn reconcile_logged(&self) -> Option<ReconcileOutcome> {
        match self.reconciler().reconcile() {
            Ok(outcome) => {
                debug!(
                    restored = ?outcome.restored,
                    duplicates = outcome.duplicates_seen,
                    deletions = outcome.deletions,
                    failed = outcome.failed_deletions,
                    "Reconciled preference cookie"
                );
                Some(outcome)
            },
            Err(e) => {
                warn!(error = %e, "Preference reconciliation failed");
                None
            },
        }
    }
}
