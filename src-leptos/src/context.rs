//! Leptos bridge: the resolved locale as a reactive signal.
//!
//! Components re-render on a change without a page reload. The engine stays
//! in [`crate::bindings`]; the context only carries signals.

use langpref_core::types::LocaleCode;
use langpref_core::{ChangeOutcome, EngineError};
use leptos::prelude::*;

use crate::bindings;

/// Reactive view of the page engine, provided through Leptos context.
#[derive(Clone, Copy)]
pub struct LocaleContext {
    locale: RwSignal<Option<LocaleCode>>,
    supported: StoredValue<Vec<LocaleCode>>,
}

impl LocaleContext {
    /// Current locale, tracked.
    pub fn locale(&self) -> Option<LocaleCode> {
        self.locale.get()
    }

    pub fn signal(&self) -> ReadSignal<Option<LocaleCode>> {
        self.locale.read_only()
    }

    pub fn supported(&self) -> Vec<LocaleCode> {
        self.supported.get_value()
    }

    /// Ask the engine to switch. The signal follows through the engine's
    /// change notification.
    pub fn request(&self, code: &str) -> Result<ChangeOutcome, EngineError> {
        let engine = bindings::engine().ok_or(EngineError::NotInitialized)?;
        engine.change_locale(code)
    }
}

/// Mirror the running engine into a signal and provide it to descendants.
///
/// Must be called inside a reactive owner (a component body) after
/// [`bindings::start`]. The engine handler is removed when the owner is
/// cleaned up.
pub fn provide_locale_context() -> Result<LocaleContext, EngineError> {
    let engine = bindings::engine().ok_or(EngineError::NotInitialized)?;

    let locale = RwSignal::new(engine.current_locale());
    let supported = StoredValue::new(engine.supported().iter().cloned().collect::<Vec<_>>());

    let handler = engine.on_change(move |code| {
        let _ = locale.try_set(Some(code.clone()));
    })?;
    on_cleanup(move || bindings::remove_handler(handler));

    let context = LocaleContext { locale, supported };
    provide_context(context);
    Ok(context)
}

/// Context provided by [`provide_locale_context`], if any ancestor did.
pub fn use_locale() -> Option<LocaleContext> {
    use_context::<LocaleContext>()
}
