//! Configuration loading: optional file, then `LANGPREF_*` environment.

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use langpref_core::types::PreferenceConfig;

const ENV_PREFIX: &str = "LANGPREF";
const LIST_KEYS: [&str; 3] = ["supported_locales", "org_markers", "legacy_scopes"];

/// Load and validate. Missing keys fall back to their defaults.
pub fn load(path: Option<&Path>) -> Result<PreferenceConfig> {
    let mut env = Environment::with_prefix(ENV_PREFIX).try_parsing(true).list_separator(",");
    for key in LIST_KEYS {
        env = env.with_list_parse_key(key);
    }
    load_with(path, env)
}

fn load_with(path: Option<&Path>, env: Environment) -> Result<PreferenceConfig> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    let config: PreferenceConfig = builder
        .add_source(env)
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Failed to parse configuration")?;
    config.validate_config().context("Invalid configuration")?;
    Ok(config)
}
