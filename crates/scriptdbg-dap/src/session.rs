//! Debug session lifecycle and the suspend loop.
//!
//! A [`Session`] belongs to one interpreter and runs on the interpreter's
//! thread. The interpreter calls [`Session::check`] at each suspension
//! point; when a breakpoint is hit, a step completes, or the client has
//! sent something, the session blocks in the suspend loop and serves
//! requests until the client resumes execution or the connection fails.

use std::cell::{Cell, Ref, RefCell};

use crate::breakpoint::{BreakpointStore, FileBreakpoints};
use crate::dispatcher::{Dispatcher, Outcome};
use crate::error::DapError;
use crate::host::{Host, Location};
use crate::protocol::{InboundMessage, OutboundMessage, StopReason};
use crate::references::ReferenceCache;
use crate::tcp::{Connector, TcpConnector};
use crate::transport::{MessageChannel, Transport};

/// Suspend checks between two transport polls when nothing else is going on.
pub const DEFAULT_PEEK_INTERVAL: u32 = 10_000;

/// Settings resolved once when the session is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Address to connect to on the first check; `None` disables auto-connect.
    pub address: Option<String>,
    /// Suspend checks between transport polls.
    pub peek_interval: u32,
    /// Opaque identifier reported in stopped events.
    pub thread_id: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            address: None,
            peek_interval: DEFAULT_PEEK_INTERVAL,
            thread_id: i64::from(std::process::id()),
        }
    }
}

/// The current state of a debug session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No client is connected.
    Detached,
    /// A client is connected and the interpreter is executing.
    Running,
    /// The interpreter is blocked serving client requests.
    Suspended,
}

struct Inner {
    config: SessionConfig,
    connector: Box<dyn Connector>,
    channel: Option<MessageChannel>,
    stepping: Option<Location>,
    attempted_connect: bool,
    peek_ticks: u32,
}

/// One debugger session per interpreter instance.
///
/// Every method takes `&self` so that interpreter code run during variable
/// inspection can hold the session and call back into it; such nested
/// calls are no-ops.
pub struct Session {
    checking: Cell<bool>,
    state: Cell<SessionState>,
    breakpoints: RefCell<BreakpointStore>,
    inner: RefCell<Inner>,
}

/// Clears the reentrancy flag when the outermost check returns.
struct CheckGuard<'a>(&'a Cell<bool>);

impl<'a> CheckGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for CheckGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Session {
    /// Create a session that connects over TCP when an address is configured.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_connector(config, Box::new(TcpConnector))
    }

    /// Create a session that uses `connector` for the lazy connection.
    pub fn with_connector(config: SessionConfig, connector: Box<dyn Connector>) -> Self {
        Self {
            checking: Cell::new(false),
            state: Cell::new(SessionState::Detached),
            breakpoints: RefCell::new(BreakpointStore::new()),
            inner: RefCell::new(Inner {
                config,
                connector,
                channel: None,
                stepping: None,
                attempted_connect: false,
                peek_ticks: 0,
            }),
        }
    }

    /// Return the current session state.
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Whether a client transport is installed.
    pub fn is_attached(&self) -> bool {
        self.state.get() != SessionState::Detached
    }

    /// Whether a suspend check is in progress on this session.
    pub fn is_checking(&self) -> bool {
        self.checking.get()
    }

    /// Current breakpoint dirty counter.
    pub fn dirty_counter(&self) -> u64 {
        self.breakpoints.borrow().dirty_counter()
    }

    /// Breakpoints registered for `path`, if any.
    pub fn file_breakpoints(&self, path: &str) -> Option<FileBreakpoints> {
        self.breakpoints.borrow().get(path).cloned()
    }

    /// Borrow the whole breakpoint store.
    pub fn breakpoints(&self) -> Ref<'_, BreakpointStore> {
        self.breakpoints.borrow()
    }

    /// Install `transport`, report an `entry` stop, and serve the client
    /// until it resumes execution.
    ///
    /// Any previously installed transport is torn down first.
    pub fn attach<H: Host>(&self, mut transport: Box<dyn Transport>, host: &mut H) {
        let Some(_guard) = CheckGuard::enter(&self.checking) else {
            tracing::warn!("attach requested from inside a suspend check; refusing");
            transport.close();
            return;
        };
        let Ok(mut inner) = self.inner.try_borrow_mut() else {
            transport.close();
            return;
        };
        self.attach_locked(&mut inner, transport, host);
    }

    /// Close the transport and release all breakpoints.
    pub fn detach(&self) {
        match self.inner.try_borrow_mut() {
            Ok(mut inner) => self.teardown(&mut inner),
            Err(_) => tracing::warn!("detach requested while the session is busy; ignoring"),
        }
    }

    /// Suspension point.
    ///
    /// Stops on a breakpoint hit or a completed step, and otherwise polls
    /// the transport every `peek_interval` calls. Returns once execution may
    /// continue. Transport failures detach the session; they are never
    /// reported to the caller.
    pub fn check<H: Host>(&self, host: &mut H) {
        let Some(_guard) = CheckGuard::enter(&self.checking) else {
            return;
        };
        let Ok(mut inner) = self.inner.try_borrow_mut() else {
            return;
        };
        let inner = &mut *inner;

        if !inner.attempted_connect {
            inner.attempted_connect = true;
            if inner.channel.is_none() {
                if let Some(transport) = connect_configured(inner) {
                    self.attach_locked(inner, transport, host);
                }
            }
        }

        if inner.channel.is_none() {
            return;
        }

        let reason = if host.check_breakpoint(&self.breakpoints.borrow()) {
            Some(StopReason::Breakpoint)
        } else if inner.stepping.is_some() {
            let location = host.current_location();
            if inner.stepping.as_ref() == Some(&location) {
                return;
            }
            inner.stepping = None;
            Some(StopReason::Step)
        } else {
            if inner.peek_ticks < inner.config.peek_interval {
                inner.peek_ticks += 1;
                return;
            }
            inner.peek_ticks = 0;
            let Some(channel) = inner.channel.as_mut() else {
                return;
            };
            match channel.peek() {
                Ok(0) => return,
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("debugger transport poll failed: {e}");
                    self.teardown(inner);
                    return;
                }
            }
        };

        self.suspend(inner, reason, host);
    }

    fn attach_locked<H: Host>(
        &self,
        inner: &mut Inner,
        transport: Box<dyn Transport>,
        host: &mut H,
    ) {
        self.teardown(inner);
        inner.channel = Some(MessageChannel::new(transport));
        inner.stepping = None;
        inner.peek_ticks = 0;
        self.state.set(SessionState::Running);
        tracing::info!("debugger attached");
        self.suspend(inner, Some(StopReason::Entry), host);
    }

    fn teardown(&self, inner: &mut Inner) {
        let Some(channel) = inner.channel.take() else {
            return;
        };
        channel.close();
        inner.stepping = None;
        inner.peek_ticks = 0;
        let mut breakpoints = self.breakpoints.borrow_mut();
        breakpoints.clear();
        breakpoints.invalidate();
        self.state.set(SessionState::Detached);
        tracing::info!("debugger detached");
    }

    /// Run one suspend cycle, detaching on any connection failure.
    fn suspend<H: Host>(&self, inner: &mut Inner, reason: Option<StopReason>, host: &mut H) {
        self.state.set(SessionState::Suspended);
        let result = self.serve(inner, reason, host);
        self.state.set(SessionState::Running);
        if let Err(e) = result {
            tracing::warn!("debugger connection lost: {e}");
            self.teardown(inner);
        }
    }

    fn serve<H: Host>(
        &self,
        inner: &mut Inner,
        reason: Option<StopReason>,
        host: &mut H,
    ) -> Result<(), DapError> {
        let channel = inner.channel.as_mut().ok_or(DapError::ConnectionClosed)?;
        if let Some(reason) = reason {
            tracing::debug!(?reason, "stopped");
            channel.write_message(&OutboundMessage::stopped(reason, inner.config.thread_id))?;
        }

        let mut references = ReferenceCache::new(host.stack_depth());
        loop {
            let message = channel.read_message()?;
            match InboundMessage::classify(message) {
                InboundMessage::Request { request } => {
                    let outcome = Dispatcher::new(host, &mut references).dispatch(&request)?;
                    match outcome {
                        Outcome::Respond(body) => {
                            channel.write_message(&OutboundMessage::response(
                                request.request_seq,
                                body,
                            ))?;
                        }
                        Outcome::Resume => {
                            channel
                                .write_message(&OutboundMessage::response(request.request_seq, None))?;
                            inner.stepping = None;
                            return Ok(());
                        }
                        Outcome::StepFrom(location) => {
                            channel
                                .write_message(&OutboundMessage::response(request.request_seq, None))?;
                            tracing::debug!(?location, "stepping");
                            inner.stepping = Some(location);
                            return Ok(());
                        }
                        Outcome::Ignore => {}
                    }
                }
                InboundMessage::Breakpoints { breakpoints } => {
                    let (path, set) = breakpoints.into_set();
                    self.breakpoints.borrow_mut().set(path, set);
                }
                InboundMessage::Continue => return Ok(()),
                InboundMessage::Unrecognized => {
                    tracing::trace!("ignoring unrecognized message");
                }
            }
        }
    }
}

fn connect_configured(inner: &mut Inner) -> Option<Box<dyn Transport>> {
    let address = inner.config.address.clone()?;
    tracing::info!(%address, "connecting to debugger");
    match inner.connector.connect(&address) {
        Ok(transport) => Some(transport),
        Err(e) => {
            tracing::warn!("{e}");
            None
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state.get())
            .field("checking", &self.checking.get())
            .field("dirty_counter", &self.dirty_counter())
            .finish_non_exhaustive()
    }
}
