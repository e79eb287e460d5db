//! The collaborator interface the embedding interpreter implements.

use serde::{Deserialize, Serialize};

use crate::breakpoint::BreakpointStore;

/// A source position reported by the interpreter.
///
/// Equality compares the file path by value, so a recompiled file with a
/// fresh string allocation still matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// Source file path.
    pub file: String,
    /// Line (1-based).
    pub line: u32,
    /// Column (1-based).
    pub column: u32,
}

impl Location {
    /// Create a location.
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

/// Full-width identity of a live composite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Coarse classification of an interpreter value, as reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// A string.
    String,
    /// An integral number.
    Integer,
    /// A non-integral number.
    Float,
    /// `true` or `false`.
    Boolean,
    /// The null value.
    Null,
    /// The undefined value.
    Undefined,
    /// Any composite value; the only kind that can be expanded.
    Object,
}

/// Services the debugger engine needs from the interpreter it controls.
///
/// The engine never inspects `Value` directly; everything goes through
/// these methods. Methods taking `&mut self` may run interpreter code
/// (getters, `toString`), which is allowed to call back into
/// [`Session::check`](crate::Session::check); such nested checks are no-ops.
pub trait Host {
    /// An interpreter value. Cloning must retain the same live object.
    type Value: Clone;

    /// Number of active call frames.
    fn stack_depth(&self) -> u32;

    /// Where execution currently is.
    fn current_location(&self) -> Location;

    /// Serializable backtrace for the `stackTrace` request.
    fn backtrace(&self) -> serde_json::Value;

    /// The global variable collection.
    fn global_variables(&mut self) -> Self::Value;

    /// Local variables of `frame` (0 = innermost).
    fn local_variables(&mut self, frame: u32) -> Self::Value;

    /// Closure variables captured by `frame`.
    fn closure_variables(&mut self, frame: u32) -> Self::Value;

    /// Classify a value.
    fn kind(&self, value: &Self::Value) -> ValueKind;

    /// Identity of a composite value; `None` for primitives.
    fn identity(&self, value: &Self::Value) -> Option<ObjectId>;

    /// String rendering used for a variable's `value` field.
    fn display(&mut self, value: &Self::Value) -> String;

    /// Own enumerable string-keyed properties, in enumeration order.
    fn properties(&mut self, value: &Self::Value) -> Vec<(String, Self::Value)>;

    /// Whether the current location is on an active breakpoint.
    ///
    /// Implementations compare [`BreakpointStore::dirty_counter`] against the
    /// value their compiled breakpoint caches were built with and rebuild
    /// them from [`BreakpointStore::get`] when it has moved.
    fn check_breakpoint(&mut self, breakpoints: &BreakpointStore) -> bool;
}
