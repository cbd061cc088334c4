//! langpref - Leptos demo page
//!
//! Starts language sync against the real browser and mounts a page that
//! re-renders on locale changes.

// Dependencies used in lib.rs submodules, acknowledged here for bin target
use chrono as _;
use gloo_timers as _;
use js_sys as _;
use serde_wasm_bindgen as _;
use wasm_bindgen as _;
use web_sys as _;

use langpref_core::types::PreferenceConfig;
use langpref_leptos::app::App;
use langpref_leptos::bindings;
use leptos::prelude::*;

fn main() {
    // Initialize panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging (ignore error if already initialized)
    drop(console_log::init_with_level(log::Level::Debug));

    log::info!("langpref demo {} starting...", bindings::langpref_version());

    if let Err(e) = bindings::start(PreferenceConfig::default()) {
        log::error!("Language sync unavailable: {e}");
    }

    mount_to_body(App);
}
