use std::cell::RefCell;
use std::rc::Rc;

use langpref_core::types::SyncEvent;
use langpref_core::{ListenerId, SignalBus};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{CustomEvent, CustomEventInit, Event, Window};

use super::defer_drop;

type DomListener = Closure<dyn FnMut(Event)>;

/// In-page broadcast as a DOM `CustomEvent` on `window`.
///
/// The event detail is `{ locale: "<code>" }`, so scripts outside the wasm
/// module can publish and subscribe too. Dispatch is synchronous.
pub struct DomSignalBus {
    event_name: String,
    listeners: RefCell<Vec<(ListenerId, DomListener)>>,
    next_id: RefCell<u64>,
}

impl DomSignalBus {
    pub fn new(event_name: &str) -> Self {
        Self {
            event_name: event_name.to_string(),
            listeners: RefCell::new(Vec::new()),
            next_id: RefCell::new(0),
        }
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    fn window() -> Option<Window> {
        web_sys::window()
    }
}

impl SignalBus for DomSignalBus {
    fn publish(&self, event: &SyncEvent) {
        let Some(window) = Self::window() else { return };
        let detail = match serde_wasm_bindgen::to_value(event) {
            Ok(detail) => detail,
            Err(e) => {
                log::warn!("Failed to encode locale event: {e}");
                return;
            },
        };
        let init = CustomEventInit::new();
        init.set_detail(&detail);
        match CustomEvent::new_with_event_init_dict(&self.event_name, &init) {
            Ok(dom_event) => {
                if let Err(e) = window.dispatch_event(&dom_event) {
                    log::warn!("Failed to dispatch {}: {e:?}", self.event_name);
                }
            },
            Err(e) => log::warn!("Failed to create {}: {e:?}", self.event_name),
        }
    }

    fn subscribe(&self, listener: Rc<dyn Fn(&SyncEvent)>) -> ListenerId {
        let id = {
            let mut next = self.next_id.borrow_mut();
            let id = ListenerId(*next);
            *next += 1;
            id
        };

        let callback: DomListener = Closure::new(move |event: Event| {
            let Some(custom) = event.dyn_ref::<CustomEvent>() else { return };
            match serde_wasm_bindgen::from_value::<SyncEvent>(custom.detail()) {
                Ok(sync) => listener(&sync),
                Err(e) => log::debug!("Ignoring malformed locale event: {e}"),
            }
        });

        if let Some(window) = Self::window() {
            if let Err(e) = window
                .add_event_listener_with_callback(&self.event_name, callback.as_ref().unchecked_ref())
            {
                log::warn!("Failed to listen for {}: {e:?}", self.event_name);
            }
        }
        self.listeners.borrow_mut().push((id, callback));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.iter().position(|(lid, _)| *lid == id).map(|i| listeners.remove(i))
        };
        let Some((_, callback)) = removed else { return };
        if let Some(window) = Self::window() {
            let _ = window.remove_event_listener_with_callback(
                &self.event_name,
                callback.as_ref().unchecked_ref(),
            );
        }
        defer_drop(callback);
    }
}

impl Drop for DomSignalBus {
    fn drop(&mut self) {
        let listeners = std::mem::take(self.listeners.get_mut());
        for (id, callback) in listeners {
            if let Some(window) = Self::window() {
                let _ = window.remove_event_listener_with_callback(
                    &self.event_name,
                    callback.as_ref().unchecked_ref(),
                );
            }
            log::debug!("Released locale listener {}", id.0);
            defer_drop(callback);
        }
    }
}
