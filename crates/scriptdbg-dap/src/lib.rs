//! scriptdbg-dap: debug protocol engine for an embedded script interpreter.
//!
//! The interpreter owns a [`Session`] and calls [`Session::check`] at every
//! suspension point. The engine decides when to stop, talks to a single
//! debugger client over length-prefixed JSON messages, and reads program
//! state through the [`Host`] trait the interpreter implements.

pub mod breakpoint;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod protocol;
pub mod references;
pub mod session;
pub mod tcp;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export key types for convenience.
pub use breakpoint::{BreakpointSet, BreakpointStore, FileBreakpoints, SourceBreakpoint};
pub use error::DapError;
pub use host::{Host, Location, ObjectId, ValueKind};
pub use protocol::*;
pub use session::{Session, SessionConfig, SessionState, DEFAULT_PEEK_INTERVAL};
pub use tcp::{Connector, TcpConnector, TcpTransport};
pub use transport::{MessageChannel, Transport};
