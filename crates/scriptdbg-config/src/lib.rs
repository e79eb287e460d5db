pub mod config;
pub mod error;
pub mod load;
pub mod merge;
pub mod validate;

pub use config::{Config, DebuggerConfig, LogConfig, LogLevel, DEFAULT_PEEK_INTERVAL};
pub use error::ConfigError;
pub use load::{apply_env_overrides, load_config, load_from_str, ADDRESS_ENV};
pub use merge::merge_configs;
