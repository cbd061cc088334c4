use std::cell::RefCell;

use langpref_core::memory::MemoryCookieJar;
use langpref_core::types::PersistenceError;
use langpref_core::{CookieJar, SetCookie};
use serde::Serialize;

/// One cookie write as the browser would have received it.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedWrite {
    pub set_cookie: String,
    pub removal: bool,
    /// Why the simulated browser refused the write, if it did
    pub rejected: Option<String>,
}

/// [`MemoryCookieJar`] that keeps a log of every write.
pub struct RecordingJar {
    inner: MemoryCookieJar,
    writes: RefCell<Vec<RecordedWrite>>,
}

impl RecordingJar {
    pub fn new(inner: MemoryCookieJar) -> Self {
        Self { inner, writes: RefCell::new(Vec::new()) }
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.borrow().clone()
    }
}

impl CookieJar for RecordingJar {
    fn values(&self, name: &str) -> Result<Vec<String>, PersistenceError> {
        self.inner.values(name)
    }

    fn store(&self, cookie: &SetCookie) -> Result<(), PersistenceError> {
        let result = self.inner.store(cookie);
        self.writes.borrow_mut().push(RecordedWrite {
            set_cookie: cookie.to_cookie_string(),
            removal: cookie.is_removal(),
            rejected: result.as_ref().err().map(ToString::to_string),
        });
        result
    }
}
