//! Envelope types exchanged with the debugger client.
//!
//! Every message is a JSON object tagged by a `type` field. The client
//! sends `request`, `breakpoints` and `continue` envelopes; the engine
//! answers with `response` and `event` envelopes.

use serde::{Deserialize, Serialize};

use crate::breakpoint::{BreakpointSet, SourceBreakpoint};
use crate::host::ValueKind;

// ---------------------------------------------------------------------------
// Inbound envelopes
// ---------------------------------------------------------------------------

/// A message received from the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundMessage {
    /// A request expecting a response.
    Request {
        /// The request payload.
        request: Request,
    },
    /// Replace the breakpoints of one file.
    Breakpoints {
        /// The update payload.
        breakpoints: BreakpointsUpdate,
    },
    /// Leave the suspend loop without a response.
    Continue,
    /// Any other `type`; consumed and ignored.
    #[serde(other)]
    Unrecognized,
}

impl InboundMessage {
    /// Classify a decoded JSON body.
    ///
    /// Bodies that do not match any known envelope shape are reported as
    /// [`InboundMessage::Unrecognized`] so the loop can drop them.
    pub fn classify(value: serde_json::Value) -> Self {
        match serde_json::from_value(value) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("dropping malformed envelope: {e}");
                InboundMessage::Unrecognized
            }
        }
    }
}

/// The payload of a `request` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Client-chosen sequence number, echoed in the response.
    #[serde(default)]
    pub request_seq: i64,
    /// The command name.
    pub command: String,
    /// Command arguments (may be absent).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub args: serde_json::Value,
}

/// The payload of a `breakpoints` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointsUpdate {
    /// Source file path the breakpoints apply to.
    pub path: String,
    /// The complete new set; `null` or absent clears the file.
    #[serde(default)]
    pub breakpoints: Option<Vec<SourceBreakpoint>>,
}

impl BreakpointsUpdate {
    /// Collect the update into a [`BreakpointSet`].
    pub fn into_set(self) -> (String, BreakpointSet) {
        let set = self.breakpoints.unwrap_or_default().into_iter().collect();
        (self.path, set)
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Arguments for the `scopes` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopesArguments {
    /// Frame index (0 = innermost).
    #[serde(default)]
    pub frame_id: u32,
}

/// Arguments for the `variables` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariablesArguments {
    /// Reference to expand.
    #[serde(default)]
    pub variables_reference: u32,
}

/// A decoded request command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resume execution.
    Continue,
    /// Step over: resume until the location changes.
    Next,
    /// Return the backtrace.
    StackTrace,
    /// Describe the scopes of a frame.
    Scopes(ScopesArguments),
    /// Enumerate the properties behind a reference.
    Variables(VariablesArguments),
    /// A command this engine does not implement, or one with unusable
    /// arguments.
    Unrecognized(String),
}

impl Command {
    /// Decode the command and its arguments from a request.
    pub fn parse(request: &Request) -> Self {
        match request.command.as_str() {
            "continue" => Command::Continue,
            "next" => Command::Next,
            "stackTrace" => Command::StackTrace,
            "scopes" => parse_args(request).map_or_else(
                || Command::Unrecognized(request.command.clone()),
                Command::Scopes,
            ),
            "variables" => parse_args(request).map_or_else(
                || Command::Unrecognized(request.command.clone()),
                Command::Variables,
            ),
            other => Command::Unrecognized(other.to_string()),
        }
    }
}

fn parse_args<T: Default + serde::de::DeserializeOwned>(request: &Request) -> Option<T> {
    if request.args.is_null() {
        return Some(T::default());
    }
    match serde_json::from_value(request.args.clone()) {
        Ok(args) => Some(args),
        Err(e) => {
            tracing::warn!(command = %request.command, "invalid arguments: {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound envelopes
// ---------------------------------------------------------------------------

/// A message sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    /// Answer to a request.
    Response {
        /// Sequence number of the request being answered.
        request_seq: i64,
        /// Command-specific body; omitted when empty.
        #[serde(skip_serializing_if = "Option::is_none")]
        body: Option<serde_json::Value>,
    },
    /// An unsolicited notification.
    Event {
        /// The event payload.
        event: Event,
    },
}

impl OutboundMessage {
    /// Build a response envelope.
    pub fn response(request_seq: i64, body: Option<serde_json::Value>) -> Self {
        OutboundMessage::Response { request_seq, body }
    }

    /// Build a stopped-event envelope.
    pub fn stopped(reason: StopReason, thread: i64) -> Self {
        OutboundMessage::Event {
            event: Event::StoppedEvent { reason, thread },
        }
    }
}

/// Event payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Execution is suspended and the engine is waiting for requests.
    StoppedEvent {
        /// Why execution stopped.
        reason: StopReason,
        /// Opaque session/thread identifier.
        thread: i64,
    },
}

/// Reason why the interpreter stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// A client attached.
    Entry,
    /// A breakpoint was hit.
    Breakpoint,
    /// A `next` completed.
    Step,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// One entry of a `scopes` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Display name ("Local", "Closure", "Global").
    pub name: String,
    /// Reference to pass to `variables`.
    pub reference: u32,
    /// Whether expanding the scope is costly.
    pub expensive: bool,
}

/// One entry of a `variables` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Property name.
    pub name: String,
    /// Value rendered as a string.
    pub value: String,
    /// Value classification.
    #[serde(rename = "type")]
    pub kind: ValueKind,
    /// Non-zero when the value can be expanded.
    #[serde(rename = "variablesReference")]
    pub variables_reference: u32,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
