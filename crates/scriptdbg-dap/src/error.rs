//! Debugger engine error types.

use thiserror::Error;

/// Errors raised while talking to a debugger client.
#[derive(Debug, Error)]
pub enum DapError {
    /// The transport primitive reported a failure or a short transfer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The peer closed the connection (a read or write returned zero bytes).
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// An inbound frame could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A `variablesReference` that is stale, out of range, or encodes scope 3.
    #[error("invalid variables reference: {0}")]
    InvalidReference(u32),

    /// The lazy connection attempt failed.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        /// The configured address.
        address: String,
        /// The underlying I/O failure.
        source: std::io::Error,
    },
}

impl DapError {
    /// Whether this error ends the current suspend cycle.
    ///
    /// Everything except an invalid reference is fatal to the connection.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DapError::InvalidReference(_))
    }
}
