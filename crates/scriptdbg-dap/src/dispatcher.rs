//! Request routing for the suspend loop.
//!
//! Decodes a request's command and produces the response body, using the
//! current cycle's reference cache for `scopes` and `variables`.

use serde::Serialize;

use crate::error::DapError;
use crate::host::{Host, Location};
use crate::protocol::{Command, Request};
use crate::references::{frame_scopes, ReferenceCache};

/// What the suspend loop should do after a request is handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Send a response with this body and keep serving requests.
    Respond(Option<serde_json::Value>),
    /// Send an empty response and resume execution.
    Resume,
    /// Send an empty response and resume until execution leaves `Location`.
    StepFrom(Location),
    /// Send nothing and keep serving requests.
    Ignore,
}

/// Routes requests for one suspend cycle.
pub struct Dispatcher<'a, H: Host> {
    host: &'a mut H,
    references: &'a mut ReferenceCache<H::Value>,
}

impl<'a, H: Host> Dispatcher<'a, H> {
    /// Create a dispatcher over `host` and the cycle's reference cache.
    pub fn new(host: &'a mut H, references: &'a mut ReferenceCache<H::Value>) -> Self {
        Self { host, references }
    }

    /// Handle one request.
    pub fn dispatch(&mut self, request: &Request) -> Result<Outcome, DapError> {
        let command = Command::parse(request);
        tracing::debug!(seq = request.request_seq, ?command, "dispatching request");
        match command {
            Command::Continue => Ok(Outcome::Resume),
            Command::Next => Ok(Outcome::StepFrom(self.host.current_location())),
            Command::StackTrace => Ok(Outcome::Respond(Some(self.host.backtrace()))),
            Command::Scopes(args) => to_body(&frame_scopes(args.frame_id)),
            Command::Variables(args) => {
                match self
                    .references
                    .variables(self.host, args.variables_reference)
                {
                    Ok(variables) => to_body(&variables),
                    Err(e) if !e.is_fatal() => {
                        tracing::warn!("variables request rejected: {e}");
                        Ok(Outcome::Respond(Some(serde_json::Value::Array(Vec::new()))))
                    }
                    Err(e) => Err(e),
                }
            }
            Command::Unrecognized(name) => {
                tracing::debug!(command = %name, "ignoring unrecognized command");
                Ok(Outcome::Ignore)
            }
        }
    }
}

fn to_body<T: Serialize>(body: &T) -> Result<Outcome, DapError> {
    let value = serde_json::to_value(body)
        .map_err(|e| DapError::Protocol(format!("failed to serialize response: {e}")))?;
    Ok(Outcome::Respond(Some(value)))
}
