use std::path::Path;

use crate::config::Config;
use crate::error::ConfigError;
use crate::merge::merge_configs;
use crate::validate::validate;

/// Environment variable that overrides `debugger.address`.
pub const ADDRESS_ENV: &str = "SCRIPTDBG_DEBUG_ADDRESS";

/// Load and merge configuration.
///
/// 1. Starts from `Config::default()`.
/// 2. Merges the TOML file at `path`, when one is given.
/// 3. Applies environment overrides (see [`apply_env_overrides`]).
/// 4. Validates the merged result.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] when `path` does not exist, and
/// other [`ConfigError`] variants on I/O, parse, or validation failure.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = Config::default();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        config = merge_configs(&config, &content)?;
        tracing::debug!("loaded config from {}", path.display());
    }

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    validate(&config).map_err(first_error)?;

    Ok(config)
}

/// Apply environment overrides to `config` using `lookup` to read variables.
///
/// `SCRIPTDBG_DEBUG_ADDRESS` replaces `debugger.address`; an empty value
/// clears it.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(address) = lookup(ADDRESS_ENV) {
        let address = address.trim();
        if address.is_empty() {
            config.debugger.address = None;
        } else {
            tracing::debug!("{ADDRESS_ENV} overrides debugger address: {address}");
            config.debugger.address = Some(address.to_string());
        }
    }
}

/// Parse a TOML string directly into a validated [`Config`].
///
/// Useful for tests or one-off parsing without file I/O.
///
/// # Errors
///
/// Returns [`ConfigError`] on parse or validation failure.
pub fn load_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;

    validate(&config).map_err(first_error)?;

    Ok(config)
}

fn first_error(errors: Vec<ConfigError>) -> ConfigError {
    errors
        .into_iter()
        .next()
        .unwrap_or_else(|| ConfigError::Validation {
            field: "unknown".to_string(),
            message: "validation failed".to_string(),
        })
}
