//! `wasm_bindgen` entry points for host pages.
//!
//! One engine per page, kept in a thread-local. Pages that are not built
//! with Leptos drive it through these exports:
//!
//! ```js
//! import init, { start_language_sync, set_language } from "./langpref_leptos.js";
//! await init();
//! const locale = start_language_sync({ supported_locales: ["en", "ru", "kk-kz"] });
//! window.addEventListener("language-preference-changed", (e) => render(e.detail.locale));
//! set_language("ru");
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use langpref_core::types::PreferenceConfig;
use langpref_core::{EngineError, EnginePorts, HandlerId, PreferenceEngine, Resolution};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Event;

use crate::browser::{
    defer_drop, DocumentCookieJar, DomSignalBus, IntervalScheduler, NavigatorLocale, WindowAddress,
};

thread_local! {
    static ENGINE: RefCell<Option<Rc<PreferenceEngine>>> = const { RefCell::new(None) };
    static PAGEHIDE: RefCell<Option<Closure<dyn FnMut(Event)>>> = const { RefCell::new(None) };
}

/// The running engine, if [`start`] has been called.
pub fn engine() -> Option<Rc<PreferenceEngine>> {
    ENGINE.with(|slot| slot.borrow().clone())
}

/// Build the engine against the real browser, run the initial load, start
/// polling and arrange teardown on `pagehide`. A running engine is stopped
/// first.
pub fn start(config: PreferenceConfig) -> Result<Resolution, EngineError> {
    stop();

    let ports = EnginePorts {
        jar: Rc::new(DocumentCookieJar),
        address: Rc::new(WindowAddress),
        client: Rc::new(NavigatorLocale),
        bus: Rc::new(DomSignalBus::new(&config.event_name)),
    };
    let engine = Rc::new(PreferenceEngine::new(config, ports)?);
    let resolution = engine.initialize();
    engine.start_polling(&IntervalScheduler)?;

    log::info!(
        "Language sync started: {} ({}), scope {}",
        resolution.locale,
        resolution.source,
        engine.scope()
    );

    ENGINE.with(|slot| *slot.borrow_mut() = Some(engine));
    install_pagehide();
    Ok(resolution)
}

/// Tear the engine down. Safe to call when nothing is running.
pub fn stop() {
    let engine = ENGINE.with(|slot| slot.borrow_mut().take());
    if let Some(engine) = engine {
        engine.teardown();
        log::info!("Language sync stopped");
    }
    remove_pagehide();
}

pub fn remove_handler(id: HandlerId) {
    if let Some(engine) = engine() {
        engine.remove_handler(id);
    }
}

fn install_pagehide() {
    let Some(window) = web_sys::window() else { return };
    let callback: Closure<dyn FnMut(Event)> = Closure::new(|_event: Event| stop());
    if let Err(e) =
        window.add_event_listener_with_callback("pagehide", callback.as_ref().unchecked_ref())
    {
        log::warn!("Failed to register pagehide teardown: {e:?}");
        return;
    }
    PAGEHIDE.with(|slot| *slot.borrow_mut() = Some(callback));
}

fn remove_pagehide() {
    let Some(callback) = PAGEHIDE.with(|slot| slot.borrow_mut().take()) else { return };
    if let Some(window) = web_sys::window() {
        let _ = window
            .remove_event_listener_with_callback("pagehide", callback.as_ref().unchecked_ref());
    }
    defer_drop(callback);
}

fn to_js(err: &EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Start syncing with a configuration object (missing fields take their
/// defaults). Returns the resolved locale.
#[wasm_bindgen]
pub fn start_language_sync(config: JsValue) -> Result<String, JsValue> {
    let config: PreferenceConfig = if config.is_undefined() || config.is_null() {
        PreferenceConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid language sync config: {e}")))?
    };
    start(config).map(|r| r.locale.to_string()).map_err(|e| to_js(&e))
}

/// User-initiated change. Returns `{ locale, persisted }`.
#[wasm_bindgen]
pub fn set_language(code: &str) -> Result<JsValue, JsValue> {
    let engine = engine().ok_or_else(|| to_js(&EngineError::NotInitialized))?;
    let outcome = engine.change_locale(code).map_err(|e| to_js(&e))?;
    serde_wasm_bindgen::to_value(&outcome).map_err(JsValue::from)
}

/// Handle returned by [`on_language_change`].
#[wasm_bindgen]
pub struct LanguageSubscription {
    handler: Option<HandlerId>,
}

#[wasm_bindgen]
impl LanguageSubscription {
    pub fn unsubscribe(&mut self) {
        if let Some(id) = self.handler.take() {
            remove_handler(id);
        }
    }
}

/// Call `callback(locale)` on every accepted change, whichever channel it
/// arrived on.
#[wasm_bindgen]
pub fn on_language_change(callback: js_sys::Function) -> Result<LanguageSubscription, JsValue> {
    let engine = engine().ok_or_else(|| to_js(&EngineError::NotInitialized))?;
    let handler = engine
        .on_change(move |locale| {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(locale.as_str())) {
                log::warn!("Language change callback threw: {e:?}");
            }
        })
        .map_err(|e| to_js(&e))?;
    Ok(LanguageSubscription { handler: Some(handler) })
}

#[wasm_bindgen]
pub fn current_language() -> Option<String> {
    engine()?.current_locale().map(|l| l.to_string())
}

#[wasm_bindgen]
pub fn stop_language_sync() {
    stop();
}

#[wasm_bindgen]
pub fn langpref_version() -> String {
    env!("GIT_VERSION").to_string()
}
