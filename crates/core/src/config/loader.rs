//! Configuration loading.
//!
//! The TOML file is the base layer. `CONTENTFORGE_`-prefixed environment
//! variables override it, with `__` between nested keys, so
//! `CONTENTFORGE_GENERATION__API_KEY` sets `generation.api_key` and
//! `CONTENTFORGE_PIPELINE__RETRY__MAX_ATTEMPTS` sets
//! `pipeline.retry.max_attempts`. Secrets are usually supplied this way.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides.
const ENV_PREFIX: &str = "CONTENTFORGE_";

/// Separator between nested keys in environment overrides.
const ENV_SEPARATOR: &str = "__";

fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR))
}

/// Reads `path` and applies environment overrides. The file must exist, even
/// when the environment would provide every setting.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    figment(path)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parses TOML text without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
