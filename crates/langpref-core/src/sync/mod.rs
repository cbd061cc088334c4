//! Cross-context locale synchronization.
//!
//! Each [`LocaleSubscriber`] is one consumer on the page. It hears changes on
//! two channels:
//! - Broadcast: synchronous fan-out over the [`SignalBus`], immediate
//! - Poll: periodic cookie re-read, for consumers that missed the broadcast
//!   or live in another browsing context
//!
//! Both channels feed the same baseline, so a change seen on one is never
//! reported again by the other.

mod state;


pub use state::HandlerId;
use state::SubscriberState;

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use langpref_types::{LocaleCode, LocaleError, SupportedLocales, SyncEvent};
use tracing::{debug, info, warn};

use crate::persistence::PreferenceStore;
use crate::ports::{Scheduler, SignalBus};

struct Shared {
    state: RefCell<SubscriberState>,
    store: PreferenceStore,
    supported: SupportedLocales,
    bus: Rc<dyn SignalBus>,
}

impl Shared {
    /// Advance the baseline and fan out. Handlers run with no borrow held.
    fn deliver(&self, locale: &LocaleCode, channel: &'static str) -> bool {
        if !self.supported.contains(locale) {
            debug!(locale = %locale, channel, "Ignoring unsupported locale notification");
            return false;
        }
        let handlers = {
            let mut state = self.state.borrow_mut();
            if state.stopped || !state.advance(locale) {
                return false;
            }
            state.snapshot()
        };
        info!(locale = %locale, channel, "Locale changed");
        for handler in handlers {
            handler(locale);
        }
        true
    }

    fn poll(&self) -> Option<LocaleCode> {
        if self.state.borrow().stopped {
            return None;
        }
        let raw = self.store.read()?;
        let locale = self.supported.lookup(&raw)?;
        self.deliver(&locale, "poll").then_some(locale)
    }
}

/// One locale consumer with its own handlers, baseline and poll loop.
///
/// Dropping the subscriber stops it.
pub struct LocaleSubscriber {
    shared: Rc<Shared>,
}

impl LocaleSubscriber {
    /// Attach to `bus`. `baseline` is the locale this consumer rendered
    /// with, if any; only changes away from it are reported.
    pub fn new(
        bus: Rc<dyn SignalBus>,
        store: PreferenceStore,
        supported: SupportedLocales,
        baseline: Option<LocaleCode>,
    ) -> Self {
        let shared = Rc::new(Shared {
            state: RefCell::new(SubscriberState::with_baseline(baseline)),
            store,
            supported,
            bus: Rc::clone(&bus),
        });

        let weak: Weak<Shared> = Rc::downgrade(&shared);
        let listener = bus.subscribe(Rc::new(move |event: &SyncEvent| {
            if let Some(shared) = weak.upgrade() {
                shared.deliver(&event.locale, "broadcast");
            }
        }));
        shared.state.borrow_mut().bus_listener = Some(listener);

        Self { shared }
    }

    pub fn on_change(&self, handler: impl Fn(&LocaleCode) + 'static) -> HandlerId {
        self.shared.state.borrow_mut().add_handler(Rc::new(handler))
    }

    pub fn remove_handler(&self, id: HandlerId) {
        self.shared.state.borrow_mut().handlers.retain(|(hid, _)| *hid != id);
    }

    /// Publish a change to every consumer on the page, this one included.
    ///
    /// Input is normalized and must be a supported locale; anything else is
    /// rejected without publishing.
    pub fn broadcast(&self, raw: &str) -> Result<LocaleCode, LocaleError> {
        if self.shared.state.borrow().stopped {
            debug!(locale = %raw, "Broadcast on stopped subscriber");
        }
        let locale = match self.shared.supported.require(raw) {
            Ok(locale) => locale,
            Err(e) => {
                warn!(locale = %raw, error = %e, "Rejected locale broadcast");
                return Err(e);
            },
        };
        self.shared.bus.publish(&SyncEvent::new(locale.clone()));
        Ok(locale)
    }

    /// Apply a change locally without publishing. Returns `true` when the
    /// baseline moved and handlers ran.
    pub fn accept(&self, locale: &LocaleCode) -> bool {
        self.shared.deliver(locale, "local")
    }

    /// One poll tick: re-read the cookie and report a change from the
    /// baseline. Absent or unsupported values are ignored.
    pub fn poll_once(&self) -> Option<LocaleCode> {
        self.shared.poll()
    }

    /// Start the poll loop. No-op when already polling or stopped.
    pub fn start_polling(&self, scheduler: &dyn Scheduler, period: Duration) {
        {
            let state = self.shared.state.borrow();
            if state.stopped || state.poll_task.as_ref().is_some_and(|t| t.is_active()) {
                return;
            }
        }
        let weak = Rc::downgrade(&self.shared);
        let task = scheduler.every(
            period,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.poll();
                }
            }),
        );
        debug!(period_ms = period.as_millis() as u64, "Started locale poll loop");
        self.shared.state.borrow_mut().poll_task = Some(task);
    }

    /// Cancel the poll loop. Safe to call repeatedly.
    pub fn stop_polling(&self) {
        let task = self.shared.state.borrow_mut().poll_task.take();
        if let Some(mut task) = task {
            task.cancel();
            debug!("Stopped locale poll loop");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.shared.state.borrow().poll_task.as_ref().is_some_and(|t| t.is_active())
    }

    pub fn baseline(&self) -> Option<LocaleCode> {
        self.shared.state.borrow().baseline.clone()
    }

    /// Move the baseline without notifying, for values the caller itself is
    /// writing.
    pub(crate) fn set_baseline(&self, locale: &LocaleCode) {
        self.shared.state.borrow_mut().baseline = Some(locale.clone());
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.state.borrow().stopped
    }

    /// Release handlers, the bus listener and the poll loop. Idempotent.
    pub fn stop(&self) {
        let (listener, task) = {
            let mut state = self.shared.state.borrow_mut();
            if state.stopped {
                return;
            }
            state.stopped = true;
            state.handlers.clear();
            (state.bus_listener.take(), state.poll_task.take())
        };
        if let Some(id) = listener {
            self.shared.bus.unsubscribe(id);
        }
        if let Some(mut task) = task {
            task.cancel();
        }
        debug!("Locale subscriber stopped");
    }
}

impl Drop for LocaleSubscriber {
    fn drop(&mut self) {
        self.stop();
    }
}
