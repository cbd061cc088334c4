//! Capabilities the engine needs from its host.
//!
//! In a browser these are `document.cookie`, `window.location`,
//! `navigator.language`, `setInterval` and DOM events. The in-memory
//! versions live in [`crate::memory`].

use std::rc::Rc;
use std::time::Duration;

use langpref_types::{PersistenceError, SyncEvent};
use url::Url;

use crate::persistence::SetCookie;

/// Ambient cookie store.
pub trait CookieJar {
    /// Every value visible under `name`, in store order.
    fn values(&self, name: &str) -> Result<Vec<String>, PersistenceError>;

    /// Commit a cookie. An `expires` in the past removes the matching entry.
    fn store(&self, cookie: &SetCookie) -> Result<(), PersistenceError>;
}

/// Read-only view of the current page address.
pub trait AddressReader {
    /// Full address, e.g. `https://apps.openedx.example.com/learning?locale=ru`.
    fn href(&self) -> Option<String>;

    fn url(&self) -> Option<Url> {
        self.href().and_then(|href| Url::parse(&href).ok())
    }

    fn hostname(&self) -> Option<String> {
        self.url().and_then(|url| url.host_str().map(str::to_string))
    }

    fn query_param(&self, name: &str) -> Option<String> {
        self.url()?
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Platform-supplied client locale (`navigator.language`).
pub trait ClientLocale {
    fn client_locale(&self) -> Option<String>;
}

/// Handle to a recurring task. Dropping the handle must also cancel it.
pub trait ScheduledTask {
    /// Stop further ticks. Safe to call more than once.
    fn cancel(&mut self);

    fn is_active(&self) -> bool;
}

/// Recurring timer source.
pub trait Scheduler {
    fn every(&self, period: Duration, tick: Box<dyn FnMut()>) -> Box<dyn ScheduledTask>;
}

/// Identifier returned by [`SignalBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Named in-page broadcast shared by every consumer on the page.
///
/// `publish` is a synchronous fan-out: listeners registered before the call
/// have run by the time it returns.
pub trait SignalBus {
    fn publish(&self, event: &SyncEvent);

    fn subscribe(&self, listener: Rc<dyn Fn(&SyncEvent)>) -> ListenerId;

    fn unsubscribe(&self, id: ListenerId);
}
