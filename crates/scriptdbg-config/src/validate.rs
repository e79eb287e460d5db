use crate::config::Config;
use crate::error::ConfigError;

/// Validate a [`Config`], returning all detected violations.
///
/// Returns `Ok(())` when the config is valid, or `Err` with a
/// vector of every validation error found.
pub fn validate(config: &Config) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.debugger.peek_interval == 0 {
        errors.push(ConfigError::Validation {
            field: "debugger.peek_interval".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    if let Some(address) = &config.debugger.address {
        if let Err(message) = check_address(address) {
            errors.push(ConfigError::Validation {
                field: "debugger.address".to_string(),
                message,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `host:port` with a non-empty host and a numeric port.
fn check_address(address: &str) -> Result<(), String> {
    let Some((host, port)) = address.rsplit_once(':') else {
        return Err(format!("expected host:port, got {address:?}"));
    };
    if host.is_empty() {
        return Err(format!("missing host in {address:?}"));
    }
    port.parse::<u16>()
        .map(|_| ())
        .map_err(|_| format!("invalid port {port:?}"))
}
