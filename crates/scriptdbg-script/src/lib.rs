//! scriptdbg-script: a tiny line-oriented interpreter that can be debugged.
//!
//! Scripts are lists of JSON assignments. The interpreter implements
//! [`scriptdbg_dap::Host`] so a debugger client can stop it, step it and
//! inspect its variables.

pub mod error;
pub mod interpreter;
pub mod parse;
pub mod value;

pub use error::ScriptError;
pub use interpreter::Interpreter;
pub use parse::{parse_script, Binding, Statement};
pub use value::ScriptValue;
