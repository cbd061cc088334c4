use langpref_core::{AddressReader, ClientLocale};

/// `window.location.href`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowAddress;

impl AddressReader for WindowAddress {
    fn href(&self) -> Option<String> {
        web_sys::window()?.location().href().ok()
    }
}

/// `navigator.language`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NavigatorLocale;

impl ClientLocale for NavigatorLocale {
    fn client_locale(&self) -> Option<String> {
        web_sys::window()?.navigator().language()
    }
}
