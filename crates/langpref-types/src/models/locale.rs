//! Locale codes and the closed set of supported locales.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unic_langid::LanguageIdentifier;

use crate::error::LocaleError;

/// Normalize a raw locale string for comparison.
///
/// Strips POSIX encoding and modifier suffixes (`ru_RU.UTF-8`, `sr@latin`),
/// unifies `_` to `-` and lower-cases the result. Returns `None` for
/// empty input.
///
/// ```
/// use langpref_types::models::normalize_tag;
///
/// assert_eq!(normalize_tag("kk_KZ"), Some("kk-kz".to_string()));
/// assert_eq!(normalize_tag(" ru-RU.UTF-8 "), Some("ru-ru".to_string()));
/// assert_eq!(normalize_tag("  "), None);
/// ```
pub fn normalize_tag(raw: &str) -> Option<String> {
    let stripped = raw.trim().split(['.', '@']).next().unwrap_or_default().trim();
    if stripped.is_empty() {
        return None;
    }
    Some(stripped.replace('_', "-").to_ascii_lowercase())
}

/// A normalized, syntactically valid language tag such as `en` or `kk-kz`.
///
/// The canonical form is lower-case with `-` separators, which is also the
/// form written to the cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocaleCode(String);

impl LocaleCode {
    /// Normalize and validate raw input.
    pub fn parse(raw: &str) -> Result<Self, LocaleError> {
        let normalized = normalize_tag(raw).ok_or(LocaleError::Empty)?;
        if LanguageIdentifier::from_str(&normalized).is_err() {
            return Err(LocaleError::Malformed { input: raw.to_string() });
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary language subtag (everything before the first separator).
    pub fn base(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LocaleCode {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LocaleCode {
    type Error = LocaleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LocaleCode> for String {
    fn from(code: LocaleCode) -> Self {
        code.0
    }
}

impl AsRef<str> for LocaleCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered, de-duplicated set of locales the deployment can render.
///
/// The first entry is the fallback unless [`SupportedLocales::with_default`]
/// picks another member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedLocales {
    codes: Vec<LocaleCode>,
    default: LocaleCode,
}

impl SupportedLocales {
    /// Build the set from raw codes. Invalid entries are dropped.
    pub fn new<I, S>(codes: I) -> Result<Self, LocaleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed: Vec<LocaleCode> = Vec::new();
        for raw in codes {
            if let Ok(code) = LocaleCode::parse(raw.as_ref()) {
                if !parsed.contains(&code) {
                    parsed.push(code);
                }
            }
        }
        let default = parsed.first().cloned().ok_or(LocaleError::NoSupportedLocales)?;
        Ok(Self { codes: parsed, default })
    }

    /// Replace the fallback locale. It must already be a member.
    pub fn with_default(mut self, raw: &str) -> Result<Self, LocaleError> {
        let code = LocaleCode::parse(raw)?;
        if !self.codes.contains(&code) {
            return Err(LocaleError::Unsupported { code: code.to_string() });
        }
        self.default = code;
        Ok(self)
    }

    pub fn default_locale(&self) -> &LocaleCode {
        &self.default
    }

    pub fn contains(&self, code: &LocaleCode) -> bool {
        self.codes.contains(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocaleCode> {
        self.codes.iter()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Exact match after normalization.
    pub fn lookup(&self, raw: &str) -> Option<LocaleCode> {
        LocaleCode::parse(raw).ok().filter(|code| self.contains(code))
    }

    /// Match on the primary subtag only.
    ///
    /// A member equal to the base (`ru` for `ru-ru`) wins over a member that
    /// merely shares it (`kk-kz` for `kk`); otherwise the first member in set
    /// order with the same base is returned.
    pub fn lookup_base(&self, raw: &str) -> Option<LocaleCode> {
        let code = LocaleCode::parse(raw).ok()?;
        let base = code.base();
        self.codes
            .iter()
            .find(|c| c.as_str() == base)
            .or_else(|| self.codes.iter().find(|c| c.base() == base))
            .cloned()
    }

    /// Exact match first, then primary subtag.
    pub fn negotiate(&self, raw: &str) -> Option<LocaleCode> {
        self.lookup(raw).or_else(|| self.lookup_base(raw))
    }

    /// Validate a code that must be a member, with a typed reason when not.
    pub fn require(&self, raw: &str) -> Result<LocaleCode, LocaleError> {
        let code = LocaleCode::parse(raw)?;
        if self.contains(&code) {
            Ok(code)
        } else {
            Err(LocaleError::Unsupported { code: code.to_string() })
        }
    }
}
