//! Domain models for the language preference engine.

mod config;
mod locale;
mod record;
mod scope;

pub use config::{
    default_cookie_name, default_event_name, default_org_markers, default_poll_interval_ms,
    default_query_param, default_supported_locales, default_ttl_days, PreferenceConfig,
};
pub use locale::{normalize_tag, LocaleCode, SupportedLocales};
pub use record::{ConsumerState, PreferenceRecord, PreferenceSource, SyncEvent};
pub use scope::DomainScope;
