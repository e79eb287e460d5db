use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default number of suspend checks between transport polls.
pub const DEFAULT_PEEK_INTERVAL: u32 = 10_000;

/// Log verbosity level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Debug messages.
    Debug,
    /// Informational messages (default).
    #[default]
    Info,
    /// Warnings only.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Filter directive understood by `tracing-subscriber`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Debugger connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebuggerConfig {
    /// `host:port` of the debugger client. Unset means never auto-connect.
    #[serde(default)]
    pub address: Option<String>,
    /// Suspend checks between transport polls (>= 1).
    #[serde(default = "default_peek_interval")]
    pub peek_interval: u32,
}

fn default_peek_interval() -> u32 {
    DEFAULT_PEEK_INTERVAL
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            address: None,
            peek_interval: DEFAULT_PEEK_INTERVAL,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log verbosity level.
    #[serde(default)]
    pub level: LogLevel,
    /// Optional path to a log file.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
        }
    }
}

/// Top-level scriptdbg configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Debugger connection.
    #[serde(default)]
    pub debugger: DebuggerConfig,
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}
