//! Browser implementations of the engine ports.
//!
//! - `document.cookie` → [`DocumentCookieJar`]
//! - `window.location` → [`WindowAddress`]
//! - `navigator.language` → [`NavigatorLocale`]
//! - `setInterval` → [`IntervalScheduler`]
//! - DOM `CustomEvent` on `window` → [`DomSignalBus`]

mod cookie;
mod events;
mod location;
mod timer;

pub use cookie::DocumentCookieJar;
pub use events::DomSignalBus;
pub use location::{NavigatorLocale, WindowAddress};
pub use timer::IntervalScheduler;

use gloo_timers::callback::Timeout;

/// Drop `value` on a later turn of the event loop.
///
/// Used for JS closures that may be released from inside their own
/// invocation.
pub(crate) fn defer_drop<T: 'static>(value: T) {
    Timeout::new(0, move || drop(value)).forget();
}
