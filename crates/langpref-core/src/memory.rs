//! In-memory port implementations.
//!
//! Used by the test suites and by the diagnostics CLI. [`MemoryCookieJar`]
//! follows the browser rules that matter here: domain matching, host-only
//! cookies, replacement keyed by (name, domain, path), removal by past
//! expiry, and creation-order listing.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use langpref_types::{DomainScope, PersistenceError, SyncEvent};

use crate::persistence::SetCookie;
use crate::ports::{AddressReader, ClientLocale, CookieJar, ListenerId, ScheduledTask, Scheduler, SignalBus};
use crate::scope::is_local_host;

#[derive(Debug, Clone)]
struct StoredCookie {
    name: String,
    value: String,
    /// Normalized domain (no leading dot) or the setting host for host-only cookies
    domain: String,
    host_only: bool,
    path: String,
    expires: DateTime<Utc>,
    created: u64,
}

impl StoredCookie {
    fn visible_to(&self, host: &str, now: DateTime<Utc>) -> bool {
        if self.expires <= now {
            return false;
        }
        if self.host_only {
            return self.domain == host;
        }
        host == self.domain || host.ends_with(&format!(".{}", self.domain))
    }

    fn scope(&self) -> DomainScope {
        if self.host_only {
            DomainScope::HostOnly
        } else {
            DomainScope::domain(format!(".{}", self.domain))
        }
    }
}

#[derive(Debug, Default)]
struct JarState {
    cookies: Vec<StoredCookie>,
    disabled: bool,
    writes: usize,
    next_created: u64,
}

/// Shared in-memory cookie store seen from one host.
///
/// Clones and [`MemoryCookieJar::for_host`] views share the same storage,
/// which models several subdomains (or tabs) of one browser profile.
#[derive(Debug, Clone)]
pub struct MemoryCookieJar {
    host: String,
    state: Rc<RefCell<JarState>>,
}

impl MemoryCookieJar {
    pub fn new(host: &str) -> Self {
        Self { host: host.to_ascii_lowercase(), state: Rc::new(RefCell::new(JarState::default())) }
    }

    /// Another host's view of the same store.
    pub fn for_host(&self, host: &str) -> Self {
        Self { host: host.to_ascii_lowercase(), state: Rc::clone(&self.state) }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Simulate disabled cookies: every call fails with `Unavailable`.
    pub fn set_disabled(&self, disabled: bool) {
        self.state.borrow_mut().disabled = disabled;
    }

    /// Number of successful non-removal stores since creation.
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }

    /// Visible copies of `name` with the scope each was stored under.
    pub fn copies(&self, name: &str) -> Vec<(DomainScope, String)> {
        let now = Utc::now();
        let state = self.state.borrow();
        let mut visible: Vec<&StoredCookie> = state
            .cookies
            .iter()
            .filter(|c| c.name == name && c.visible_to(&self.host, now))
            .collect();
        visible.sort_by(|a, b| b.path.len().cmp(&a.path.len()).then(a.created.cmp(&b.created)));
        visible.into_iter().map(|c| (c.scope(), c.value.clone())).collect()
    }

    /// `document.cookie`-style header of everything visible to this host.
    pub fn header(&self) -> String {
        let now = Utc::now();
        let state = self.state.borrow();
        state
            .cookies
            .iter()
            .filter(|c| c.visible_to(&self.host, now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn normalize_domain(&self, cookie: &SetCookie) -> Result<(String, bool), PersistenceError> {
        let Some(raw) = cookie.scope.attribute() else {
            return Ok((self.host.clone(), true));
        };
        let domain = raw.trim().trim_start_matches('.').to_ascii_lowercase();
        let reject = |reason: &str| PersistenceError::Rejected {
            name: cookie.name.clone(),
            domain: raw.to_string(),
            reason: reason.to_string(),
        };
        if domain.is_empty() {
            return Err(reject("empty domain"));
        }
        if is_local_host(&self.host) && domain != self.host {
            return Err(reject("domain attribute on a local host"));
        }
        if !domain.contains('.') && domain != self.host {
            return Err(reject("top-level domain"));
        }
        if self.host != domain && !self.host.ends_with(&format!(".{domain}")) {
            return Err(reject("domain does not match host"));
        }
        Ok((domain, false))
    }
}

impl CookieJar for MemoryCookieJar {
    fn values(&self, name: &str) -> Result<Vec<String>, PersistenceError> {
        if self.state.borrow().disabled {
            return Err(PersistenceError::unavailable("cookies disabled"));
        }
        Ok(self.copies(name).into_iter().map(|(_, value)| value).collect())
    }

    fn store(&self, cookie: &SetCookie) -> Result<(), PersistenceError> {
        if self.state.borrow().disabled {
            return Err(PersistenceError::unavailable("cookies disabled"));
        }
        let (domain, host_only) = self.normalize_domain(cookie)?;
        let mut state = self.state.borrow_mut();

        let existing = state.cookies.iter().position(|c| {
            c.name == cookie.name && c.domain == domain && c.host_only == host_only && c.path == cookie.path
        });

        if cookie.is_removal() {
            if let Some(index) = existing {
                state.cookies.remove(index);
            }
            return Ok(());
        }

        state.writes += 1;
        match existing {
            Some(index) => {
                let stored = &mut state.cookies[index];
                stored.value = cookie.value.clone();
                stored.expires = cookie.expires;
            },
            None => {
                let created = state.next_created;
                state.next_created += 1;
                state.cookies.push(StoredCookie {
                    name: cookie.name.clone(),
                    value: cookie.value.clone(),
                    domain,
                    host_only,
                    path: cookie.path.clone(),
                    expires: cookie.expires,
                    created,
                });
            },
        }
        Ok(())
    }
}

/// Settable page address.
#[derive(Debug, Clone)]
pub struct StaticAddress {
    href: Rc<RefCell<Option<String>>>,
}

impl StaticAddress {
    pub fn new(href: &str) -> Self {
        Self { href: Rc::new(RefCell::new(Some(href.to_string()))) }
    }

    pub fn set_href(&self, href: &str) {
        *self.href.borrow_mut() = Some(href.to_string());
    }
}

impl AddressReader for StaticAddress {
    fn href(&self) -> Option<String> {
        self.href.borrow().clone()
    }
}

/// Fixed client locale signal.
#[derive(Debug, Clone, Default)]
pub struct FixedClientLocale(pub Option<String>);

impl FixedClientLocale {
    pub fn new(locale: &str) -> Self {
        Self(Some(locale.to_string()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl ClientLocale for FixedClientLocale {
    fn client_locale(&self) -> Option<String> {
        self.0.clone()
    }
}

struct ManualSlot {
    period: Duration,
    elapsed: Cell<Duration>,
    active: Rc<Cell<bool>>,
    tick: RefCell<Box<dyn FnMut()>>,
}

/// Timer source driven by the test: nothing fires until
/// [`ManualScheduler::advance`] or [`ManualScheduler::tick_all`].
#[derive(Clone, Default)]
pub struct ManualScheduler {
    slots: Rc<RefCell<Vec<Rc<ManualSlot>>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tasks(&self) -> usize {
        self.slots.borrow().iter().filter(|slot| slot.active.get()).count()
    }

    /// Fire every active task once.
    pub fn tick_all(&self) {
        for slot in self.snapshot() {
            Self::fire(&slot);
        }
    }

    /// Move time forward, firing each task once per elapsed period.
    pub fn advance(&self, by: Duration) {
        for slot in self.snapshot() {
            let mut elapsed = slot.elapsed.get() + by;
            while slot.active.get() && !slot.period.is_zero() && elapsed >= slot.period {
                elapsed -= slot.period;
                Self::fire(&slot);
            }
            slot.elapsed.set(elapsed);
        }
    }

    fn snapshot(&self) -> Vec<Rc<ManualSlot>> {
        let mut slots = self.slots.borrow_mut();
        slots.retain(|slot| slot.active.get());
        slots.clone()
    }

    fn fire(slot: &ManualSlot) {
        if slot.active.get() {
            if let Ok(mut tick) = slot.tick.try_borrow_mut() {
                (tick)();
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, period: Duration, tick: Box<dyn FnMut()>) -> Box<dyn ScheduledTask> {
        let active = Rc::new(Cell::new(true));
        self.slots.borrow_mut().push(Rc::new(ManualSlot {
            period,
            elapsed: Cell::new(Duration::ZERO),
            active: Rc::clone(&active),
            tick: RefCell::new(tick),
        }));
        Box::new(ManualTask { active })
    }
}

struct ManualTask {
    active: Rc<Cell<bool>>,
}

impl ScheduledTask for ManualTask {
    fn cancel(&mut self) {
        self.active.set(false);
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Drop for ManualTask {
    fn drop(&mut self) {
        self.active.set(false);
    }
}

#[derive(Default)]
struct BusState {
    listeners: Vec<(ListenerId, Rc<dyn Fn(&SyncEvent)>)>,
    next_id: u64,
    published: usize,
}

/// Same-page broadcast without a DOM.
#[derive(Clone, Default)]
pub struct LocalSignalBus {
    state: Rc<RefCell<BusState>>,
}

impl LocalSignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn published(&self) -> usize {
        self.state.borrow().published
    }
}

impl SignalBus for LocalSignalBus {
    fn publish(&self, event: &SyncEvent) {
        let listeners: Vec<Rc<dyn Fn(&SyncEvent)>> = {
            let mut state = self.state.borrow_mut();
            state.published += 1;
            state.listeners.iter().map(|(_, l)| Rc::clone(l)).collect()
        };
        for listener in listeners {
            listener(event);
        }
    }

    fn subscribe(&self, listener: Rc<dyn Fn(&SyncEvent)>) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.state.borrow_mut().listeners.retain(|(lid, _)| *lid != id);
    }
}
