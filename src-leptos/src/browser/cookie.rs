use langpref_core::persistence::parse_cookie_header;
use langpref_core::types::PersistenceError;
use langpref_core::{CookieJar, SetCookie};
use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

/// `document.cookie`.
///
/// The browser drops rejected writes silently, so a refused `domain`
/// attribute only shows up on read-back.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentCookieJar;

impl DocumentCookieJar {
    fn document() -> Result<HtmlDocument, PersistenceError> {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.dyn_into::<HtmlDocument>().ok())
            .ok_or_else(|| PersistenceError::unavailable("no HTML document"))
    }
}

impl CookieJar for DocumentCookieJar {
    fn values(&self, name: &str) -> Result<Vec<String>, PersistenceError> {
        let header = Self::document()?
            .cookie()
            .map_err(|e| PersistenceError::unavailable(format!("cookie read blocked: {e:?}")))?;
        Ok(parse_cookie_header(&header, name))
    }

    fn store(&self, cookie: &SetCookie) -> Result<(), PersistenceError> {
        Self::document()?
            .set_cookie(&cookie.to_cookie_string())
            .map_err(|e| PersistenceError::unavailable(format!("cookie write blocked: {e:?}")))
    }
}
