//! The demo interpreter and its debugger host implementation.

use std::path::Path;

use scriptdbg_dap::{BreakpointSet, BreakpointStore, Host, Location, ObjectId, Session, ValueKind};

use crate::error::ScriptError;
use crate::parse::{parse_script, Binding, Statement};
use crate::value::ScriptValue;

/// Compiled breakpoint lines for the running script, keyed by the store's
/// dirty counter at the time they were copied.
#[derive(Debug, Default)]
struct HitCache {
    dirty: Option<u64>,
    lines: Option<BreakpointSet>,
    rebuilds: u32,
}

/// Executes a parsed script one statement at a time.
#[derive(Debug)]
pub struct Interpreter {
    path: String,
    statements: Vec<Statement>,
    globals: ScriptValue,
    locals: ScriptValue,
    line: u32,
    hits: HitCache,
}

impl Interpreter {
    /// Parse `source`; `path` is the file identity reported to the debugger.
    pub fn new(path: impl Into<String>, source: &str) -> Result<Self, ScriptError> {
        let statements = parse_script(source)?;
        let line = statements.first().map_or(1, |s| s.line);
        Ok(Self {
            path: path.into(),
            statements,
            globals: ScriptValue::object(),
            locals: ScriptValue::object(),
            line,
            hits: HitCache::default(),
        })
    }

    /// Read and parse the script at `path`.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let source = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(path.display().to_string(), &source)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Run every statement, giving `session` a suspension point before each.
    pub fn run(&mut self, session: &Session) {
        tracing::info!(path = %self.path, statements = self.statements.len(), "running script");
        for index in 0..self.statements.len() {
            self.line = self.statements[index].line;
            session.check(self);
            self.execute(index);
        }
    }

    fn execute(&mut self, index: usize) {
        let statement = &self.statements[index];
        let value = ScriptValue::from_json(&statement.value);
        let scope = match statement.binding {
            Binding::Global => &self.globals,
            Binding::Local => &self.locals,
        };
        scope.set(&statement.name, value);
        tracing::trace!(line = statement.line, name = %statement.name, "assigned");
    }

    /// The global object.
    pub fn globals(&self) -> &ScriptValue {
        &self.globals
    }

    /// The locals of the single script frame.
    pub fn locals(&self) -> &ScriptValue {
        &self.locals
    }
}

impl Host for Interpreter {
    type Value = ScriptValue;

    fn stack_depth(&self) -> u32 {
        1
    }

    fn current_location(&self) -> Location {
        Location::new(self.path.clone(), self.line, 1)
    }

    fn backtrace(&self) -> serde_json::Value {
        serde_json::json!([{
            "id": 0,
            "name": "<script>",
            "file": self.path,
            "line": self.line,
            "column": 1,
        }])
    }

    fn global_variables(&mut self) -> ScriptValue {
        self.globals.clone()
    }

    fn local_variables(&mut self, frame: u32) -> ScriptValue {
        if frame == 0 {
            self.locals.clone()
        } else {
            ScriptValue::object()
        }
    }

    fn closure_variables(&mut self, _frame: u32) -> ScriptValue {
        ScriptValue::object()
    }

    fn kind(&self, value: &ScriptValue) -> ValueKind {
        value.kind()
    }

    fn identity(&self, value: &ScriptValue) -> Option<ObjectId> {
        value.identity()
    }

    fn display(&mut self, value: &ScriptValue) -> String {
        value.display()
    }

    fn properties(&mut self, value: &ScriptValue) -> Vec<(String, ScriptValue)> {
        value.properties()
    }

    fn check_breakpoint(&mut self, breakpoints: &BreakpointStore) -> bool {
        let counter = breakpoints.dirty_counter();
        if self.hits.dirty != Some(counter) {
            self.hits.lines = breakpoints
                .get(&self.path)
                .map(|file| file.breakpoints.clone());
            self.hits.dirty = Some(counter);
            self.hits.rebuilds += 1;
            tracing::debug!(path = %self.path, counter, "recompiled breakpoints");
        }
        self.hits
            .lines
            .as_ref()
            .is_some_and(|lines| lines.contains(self.line, 1))
    }
}
