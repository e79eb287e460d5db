use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: {message}")]
    Parse { line: u32, message: String },

    #[error("failed to read script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
