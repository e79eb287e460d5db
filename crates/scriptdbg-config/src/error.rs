use std::path::PathBuf;
use thiserror::Error;

/// Why a scriptdbg configuration could not be resolved.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("no config file at {}", .0.display())]
    NotFound(PathBuf),

    /// The file (or a layer) is not valid TOML for [`crate::Config`].
    #[error("invalid config TOML: {0}")]
    Parse(String),

    /// A setting has an unusable value.
    #[error("bad value for {field}: {message}")]
    Validation { field: String, message: String },

    /// Reading the config file failed.
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
}
