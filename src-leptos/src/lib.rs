//! langpref - Browser bindings and Leptos bridge
//!
//! - `browser`: `CookieJar`/`AddressReader`/`ClientLocale`/`Scheduler`/`SignalBus`
//!   over `document`, `window` and gloo timers
//! - `bindings`: page-level engine and `wasm_bindgen` exports
//! - `context`: `provide_locale_context` / `use_locale` for Leptos views
//! - `app`: demo page with a language switcher

pub mod app;
pub mod bindings;
pub mod browser;
pub mod context;
