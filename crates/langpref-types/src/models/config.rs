//! Preference engine configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::locale::SupportedLocales;
use crate::error::{ConfigError, LocaleError};

/// Deployment configuration for resolution, scoping and sync.
///
/// Every field has a serde default, so an empty JSON object is a valid
/// configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct PreferenceConfig {
    /// Name of the preference cookie
    #[validate(length(min = 1))]
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Query parameter that overrides the locale (e.g. `?locale=ru`)
    #[validate(length(min = 1))]
    #[serde(default = "default_query_param")]
    pub query_param: String,
    /// Locales the deployment can render; first entry is the fallback
    #[validate(length(min = 1))]
    #[serde(default = "default_supported_locales")]
    pub supported_locales: Vec<String>,
    /// Explicit fallback locale; must be one of `supported_locales`
    #[serde(default)]
    pub default_locale: Option<String>,
    /// Cookie lifetime in days
    #[validate(range(min = 1_u32, max = 3650_u32))]
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,
    /// Fallback poll period in milliseconds
    #[validate(range(min = 100_u32))]
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u32,
    /// Operator override for the cookie `domain` attribute
    #[serde(default)]
    pub cookie_domain: Option<String>,
    /// Host labels that mark the start of an organization's shared suffix
    #[serde(default = "default_org_markers")]
    pub org_markers: Vec<String>,
    /// Domain attributes used by earlier deployments that must be cleaned up
    #[serde(default)]
    pub legacy_scopes: Vec<String>,
    /// Name of the in-page change event
    #[validate(length(min = 1))]
    #[serde(default = "default_event_name")]
    pub event_name: String,
}

impl Default for PreferenceConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            query_param: default_query_param(),
            supported_locales: default_supported_locales(),
            default_locale: None,
            ttl_days: default_ttl_days(),
            poll_interval_ms: default_poll_interval_ms(),
            cookie_domain: None,
            org_markers: default_org_markers(),
            legacy_scopes: Vec::new(),
            event_name: default_event_name(),
        }
    }
}

impl PreferenceConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::from_json_error(&e))?;
        config.validate_config()?;
        Ok(config)
    }

    /// Field validation plus the cross-field checks validator can't express.
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        self.validate().map_err(|e| ConfigError::from_validation_errors(&e))?;
        if !is_cookie_token(&self.cookie_name) {
            return Err(ConfigError::ValidationError {
                field: "cookie_name".to_string(),
                message: "must contain cookie token characters only".to_string(),
            });
        }
        if let Some(domain) = self.configured_domain() {
            check_domain_attribute("cookie_domain", domain)?;
        }
        for scope in &self.legacy_scopes {
            check_domain_attribute("legacy_scopes", scope.trim())?;
        }
        self.supported().map_err(|e| ConfigError::ValidationError {
            field: "supported_locales".to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Normalized supported set with the configured fallback applied.
    pub fn supported(&self) -> Result<SupportedLocales, LocaleError> {
        let set = SupportedLocales::new(&self.supported_locales)?;
        match self.default_locale.as_deref() {
            Some(raw) => set.with_default(raw),
            None => Ok(set),
        }
    }

    /// Operator domain override with blank values treated as unset.
    pub fn configured_domain(&self) -> Option<&str> {
        self.cookie_domain.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }
}

// RFC 6265 token characters only; the name is interpolated into cookie strings.
fn is_cookie_token(name: &str) -> bool {
    name.bytes().all(|b| {
        b.is_ascii_alphanumeric()
            || matches!(
                b,
                b'-' | b'_' | b'.' | b'!' | b'#' | b'$' | b'%' | b'&' | b'*' | b'+' | b'^' | b'`'
                    | b'|' | b'~'
            )
    })
}

// Domains are interpolated into `Set-Cookie` strings as attribute values.
fn check_domain_attribute(field: &str, domain: &str) -> Result<(), ConfigError> {
    let bad = domain
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || matches!(c, ';' | '=' | ','));
    match bad {
        Some(c) => Err(ConfigError::ValidationError {
            field: field.to_string(),
            message: format!("{domain:?} contains {c:?}"),
        }),
        None => Ok(()),
    }
}

// Default value functions
pub fn default_cookie_name() -> String {
    "openedx-language-preference".to_string()
}

pub fn default_query_param() -> String {
    "locale".to_string()
}

pub fn default_supported_locales() -> Vec<String> {
    vec!["en".to_string(), "ru".to_string(), "kk-kz".to_string()]
}

pub const fn default_ttl_days() -> u32 {
    365
}

pub const fn default_poll_interval_ms() -> u32 {
    2000
}

pub fn default_org_markers() -> Vec<String> {
    vec!["openedx".to_string()]
}

pub fn default_event_name() -> String {
    "language-preference-changed".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = PreferenceConfig::from_json("{}").unwrap();
        assert_eq!(config, PreferenceConfig::default());
        assert_eq!(config.ttl_days, 365);
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.supported().unwrap().default_locale().as_str(), "en");
    }

    #[test]
    fn test_rejects_zero_ttl() {
        let err = PreferenceConfig::from_json(r#"{"ttl_days": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "ttl_days"));
    }

    #[test]
    fn test_rejects_bad_cookie_name() {
        let err = PreferenceConfig::from_json(r#"{"cookie_name": "a b;c"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "cookie_name"));
    }

    #[test]
    fn test_rejects_default_outside_supported() {
        let err = PreferenceConfig::from_json(r#"{"default_locale": "fr"}"#).unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { ref field, .. } if field == "supported_locales")
        );
    }

    #[test]
    fn test_rejects_all_invalid_locales() {
        let err = PreferenceConfig::from_json(r#"{"supported_locales": ["", "%%%"]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_rejects_attribute_injection_in_cookie_domain() {
        let err = PreferenceConfig::from_json(r#"{"cookie_domain": ".example.com; Secure"}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "cookie_domain"));

        let err = PreferenceConfig::from_json(r#"{"cookie_domain": ".example.com;path=/x"}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "cookie_domain"));
    }

    #[test]
    fn test_rejects_attribute_injection_in_legacy_scopes() {
        let err = PreferenceConfig::from_json(
            r#"{"legacy_scopes": [".example.com", ".old.example.com; max-age=0"]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "legacy_scopes"));
    }

    #[test]
    fn test_accepts_plain_domains() {
        let config = PreferenceConfig::from_json(
            r#"{"cookie_domain": " .example.com ", "legacy_scopes": ["example.com", " .old.example.com"]}"#,
        )
        .unwrap();
        assert_eq!(config.configured_domain(), Some(".example.com"));
    }

    #[test]
    fn test_parse_error_is_typed() {
        let err = PreferenceConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_blank_domain_override_is_unset() {
        let config = PreferenceConfig {
            cookie_domain: Some("   ".to_string()),
            ..PreferenceConfig::default()
        };
        assert!(config.configured_domain().is_none());
    }
}
