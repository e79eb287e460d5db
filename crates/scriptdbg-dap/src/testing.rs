//! In-memory transport and host doubles for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::rc::Rc;

use crate::breakpoint::BreakpointStore;
use crate::error::DapError;
use crate::host::{Host, Location, ObjectId, ValueKind};
use crate::session::Session;
use crate::tcp::Connector;
use crate::transport::{decode_message, encode_message, Transport};

#[derive(Debug, Default)]
struct MockState {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    closed: bool,
    fail_writes: bool,
    fail_peek: bool,
    peeks: usize,
}

/// Scripted transport. Clones share state so a test can keep a handle
/// after boxing one into a session.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
    chunk_size: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit every read and write to `size` bytes.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn failing_writes(self) -> Self {
        self.state.borrow_mut().fail_writes = true;
        self
    }

    pub fn failing_peek(self) -> Self {
        self.state.borrow_mut().fail_peek = true;
        self
    }

    pub fn push_bytes(&self, bytes: &[u8]) {
        self.state.borrow_mut().inbound.extend(bytes.iter().copied());
    }

    pub fn push_message(&self, value: &serde_json::Value) {
        let bytes = encode_message(value).unwrap();
        self.push_bytes(&bytes);
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().inbound.len()
    }

    pub fn sent_messages(&self) -> Vec<serde_json::Value> {
        let state = self.state.borrow();
        let mut messages = Vec::new();
        let mut rest = &state.outbound[..];
        while !rest.is_empty() {
            let (value, consumed) = decode_message(rest).unwrap();
            messages.push(value);
            rest = &rest[consumed..];
        }
        messages
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    pub fn peek_count(&self) -> usize {
        self.state.borrow().peeks
    }

    fn limit(&self, len: usize) -> usize {
        if self.chunk_size == 0 {
            len
        } else {
            len.min(self.chunk_size)
        }
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.limit(buf.len());
        let mut state = self.state.borrow_mut();
        let n = n.min(state.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(state.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.limit(buf.len());
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure"));
        }
        state.outbound.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn peek(&mut self) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        state.peeks += 1;
        if state.fail_peek {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "mock peek failure"));
        }
        Ok(state.inbound.len())
    }

    fn close(&mut self) {
        self.state.borrow_mut().closed = true;
    }
}

#[derive(Debug)]
pub struct MockObject {
    pub entries: Vec<(String, MockValue)>,
}

#[derive(Debug, Clone)]
pub enum MockValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
    Object(Rc<MockObject>),
}

impl MockValue {
    pub fn object(entries: Vec<(&str, MockValue)>) -> Self {
        MockValue::Object(Rc::new(MockObject {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }))
    }
}

/// A host with a fixed stack and settable location.
pub struct MockHost {
    depth: u32,
    location: Location,
    globals: MockValue,
    locals: HashMap<u32, MockValue>,
    closures: HashMap<u32, MockValue>,
    scope_loads: u32,
    reentrant: Option<Rc<Session>>,
    nested_checks: u32,
    saw_checking: bool,
}

impl MockHost {
    pub fn new(depth: u32) -> Self {
        Self {
            depth,
            location: Location::new("/src/main.js", 1, 1),
            globals: MockValue::object(vec![]),
            locals: HashMap::new(),
            closures: HashMap::new(),
            scope_loads: 0,
            reentrant: None,
            nested_checks: 0,
            saw_checking: false,
        }
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    pub fn set_globals(&mut self, globals: MockValue) {
        self.globals = globals;
    }

    pub fn set_local(&mut self, frame: u32, value: MockValue) {
        self.locals.insert(frame, value);
    }

    pub fn scope_loads(&self) -> u32 {
        self.scope_loads
    }

    /// Call back into `session` from every property enumeration.
    pub fn reenter_through(&mut self, session: Rc<Session>) {
        self.reentrant = Some(session);
    }

    pub fn nested_checks(&self) -> u32 {
        self.nested_checks
    }

    pub fn saw_checking(&self) -> bool {
        self.saw_checking
    }
}

impl Host for MockHost {
    type Value = MockValue;

    fn stack_depth(&self) -> u32 {
        self.depth
    }

    fn current_location(&self) -> Location {
        self.location.clone()
    }

    fn backtrace(&self) -> serde_json::Value {
        serde_json::json!([{
            "id": 0,
            "name": "main",
            "file": self.location.file,
            "line": self.location.line,
        }])
    }

    fn global_variables(&mut self) -> MockValue {
        self.scope_loads += 1;
        self.globals.clone()
    }

    fn local_variables(&mut self, frame: u32) -> MockValue {
        self.scope_loads += 1;
        self.locals
            .get(&frame)
            .cloned()
            .unwrap_or_else(|| MockValue::object(vec![]))
    }

    fn closure_variables(&mut self, frame: u32) -> MockValue {
        self.scope_loads += 1;
        self.closures
            .get(&frame)
            .cloned()
            .unwrap_or_else(|| MockValue::object(vec![]))
    }

    fn kind(&self, value: &MockValue) -> ValueKind {
        match value {
            MockValue::Int(_) => ValueKind::Integer,
            MockValue::Float(_) => ValueKind::Float,
            MockValue::Str(_) => ValueKind::String,
            MockValue::Bool(_) => ValueKind::Boolean,
            MockValue::Null => ValueKind::Null,
            MockValue::Undefined => ValueKind::Undefined,
            MockValue::Object(_) => ValueKind::Object,
        }
    }

    fn identity(&self, value: &MockValue) -> Option<ObjectId> {
        match value {
            MockValue::Object(obj) => Some(ObjectId(Rc::as_ptr(obj) as usize as u64)),
            _ => None,
        }
    }

    fn display(&mut self, value: &MockValue) -> String {
        match value {
            MockValue::Int(n) => n.to_string(),
            MockValue::Float(f) => f.to_string(),
            MockValue::Str(s) => s.clone(),
            MockValue::Bool(b) => b.to_string(),
            MockValue::Null => "null".into(),
            MockValue::Undefined => "undefined".into(),
            MockValue::Object(_) => "[object Object]".into(),
        }
    }

    fn properties(&mut self, value: &MockValue) -> Vec<(String, MockValue)> {
        if let Some(session) = self.reentrant.clone() {
            self.nested_checks += 1;
            self.saw_checking |= session.is_checking();
            session.check(self);
        }
        match value {
            MockValue::Object(obj) => obj.entries.clone(),
            _ => Vec::new(),
        }
    }

    fn check_breakpoint(&mut self, breakpoints: &BreakpointStore) -> bool {
        breakpoints
            .get(&self.location.file)
            .is_some_and(|file| file.breakpoints.contains(self.location.line, self.location.column))
    }
}

/// Connector that hands out one prepared transport, or refuses.
#[derive(Debug, Default)]
pub struct MockConnector {
    transport: Option<MockTransport>,
    addresses: Rc<RefCell<Vec<String>>>,
}

impl MockConnector {
    pub fn offering(transport: MockTransport) -> Self {
        Self {
            transport: Some(transport),
            addresses: Rc::default(),
        }
    }

    pub fn refusing() -> Self {
        Self::default()
    }

    /// Shared log of every address a connection was attempted to.
    pub fn attempts(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.addresses)
    }
}

impl Connector for MockConnector {
    fn connect(&mut self, address: &str) -> Result<Box<dyn Transport>, DapError> {
        self.addresses.borrow_mut().push(address.to_string());
        match self.transport.take() {
            Some(transport) => Ok(Box::new(transport)),
            None => Err(DapError::Connect {
                address: address.to_string(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "mock refused"),
            }),
        }
    }
}
