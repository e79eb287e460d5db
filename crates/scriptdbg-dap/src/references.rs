//! Per-suspend-cycle variable reference cache.
//!
//! References below `stack_depth << 2` are scope references computed as
//! `(frame << 2) + scope`; they are never allocated. Every reference at or
//! above that threshold names a composite value retained for the rest of
//! the cycle. A reference is meaningless once the cycle ends.

use std::collections::{BTreeMap, HashMap};

use crate::error::DapError;
use crate::host::{Host, ObjectId, ValueKind};
use crate::protocol::{Scope, Variable};

/// The three scopes reported for every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Global variables.
    Global = 0,
    /// Frame-local variables.
    Local = 1,
    /// Variables captured by the frame's closure.
    Closure = 2,
}

impl ScopeKind {
    fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(ScopeKind::Global),
            1 => Some(ScopeKind::Local),
            2 => Some(ScopeKind::Closure),
            _ => None,
        }
    }

    /// Display name used in `scopes` responses.
    pub fn name(self) -> &'static str {
        match self {
            ScopeKind::Global => "Global",
            ScopeKind::Local => "Local",
            ScopeKind::Closure => "Closure",
        }
    }
}

/// Encode the reference for `scope` of `frame`.
pub fn scope_reference(frame: u32, scope: ScopeKind) -> u32 {
    (frame << 2) + scope as u32
}

/// Split a scope reference into its frame and scope.
///
/// Tag 3 is never produced and is rejected.
pub fn decode_scope_reference(reference: u32) -> Result<(u32, ScopeKind), DapError> {
    let scope = ScopeKind::from_tag(reference % 4).ok_or(DapError::InvalidReference(reference))?;
    Ok((reference >> 2, scope))
}

/// Scope descriptors for `frame`, in Local, Closure, Global order.
pub fn frame_scopes(frame: u32) -> Vec<Scope> {
    [ScopeKind::Local, ScopeKind::Closure, ScopeKind::Global]
        .into_iter()
        .map(|kind| Scope {
            name: kind.name().to_string(),
            reference: scope_reference(frame, kind),
            expensive: kind == ScopeKind::Global,
        })
        .collect()
}

/// Reference table for one suspend cycle.
#[derive(Debug)]
pub struct ReferenceCache<V> {
    stack_depth: u32,
    next_reference: u32,
    references: BTreeMap<u32, V>,
    identities: HashMap<ObjectId, u32>,
}

impl<V: Clone> ReferenceCache<V> {
    /// Start a cycle for an interpreter with `stack_depth` frames.
    pub fn new(stack_depth: u32) -> Self {
        // Reference 0 means "not expandable", so allocation never starts
        // below the first frame's scope block, even with an empty stack.
        let first = stack_depth.max(1) << 2;
        Self {
            stack_depth,
            next_reference: first,
            references: BTreeMap::new(),
            identities: HashMap::new(),
        }
    }

    /// The smallest reference that names an object rather than a scope.
    pub fn scope_limit(&self) -> u32 {
        self.stack_depth << 2
    }

    /// Number of entries currently retained (objects and materialized scopes).
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Whether nothing has been retained yet.
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Return the reference for `value`, allocating one on first sight.
    ///
    /// Returns 0 for values that cannot be expanded.
    pub fn get_or_allocate<H>(&mut self, host: &H, value: &V) -> u32
    where
        H: Host<Value = V>,
    {
        if host.kind(value) != ValueKind::Object {
            return 0;
        }
        let Some(identity) = host.identity(value) else {
            return 0;
        };
        if let Some(&reference) = self.identities.get(&identity) {
            return reference;
        }
        let reference = self.next_reference;
        self.next_reference += 1;
        self.references.insert(reference, value.clone());
        self.identities.insert(identity, reference);
        tracing::trace!(reference, identity = identity.0, "allocated variables reference");
        reference
    }

    /// Look up the value behind `reference`, materializing scopes lazily.
    pub fn resolve<H>(&mut self, host: &mut H, reference: u32) -> Result<V, DapError>
    where
        H: Host<Value = V>,
    {
        if let Some(value) = self.references.get(&reference) {
            return Ok(value.clone());
        }
        if reference >= self.scope_limit() {
            return Err(DapError::InvalidReference(reference));
        }
        let (frame, scope) = decode_scope_reference(reference)?;
        let value = match scope {
            ScopeKind::Global => host.global_variables(),
            ScopeKind::Local => host.local_variables(frame),
            ScopeKind::Closure => host.closure_variables(frame),
        };
        tracing::trace!(reference, frame, ?scope, "materialized scope");
        self.references.insert(reference, value.clone());
        Ok(value)
    }

    /// Enumerate the properties behind `reference` as client variables.
    pub fn variables<H>(&mut self, host: &mut H, reference: u32) -> Result<Vec<Variable>, DapError>
    where
        H: Host<Value = V>,
    {
        let container = self.resolve(host, reference)?;
        let properties = host.properties(&container);
        let mut variables = Vec::with_capacity(properties.len());
        for (name, value) in properties {
            let variables_reference = self.get_or_allocate(host, &value);
            variables.push(Variable {
                name,
                value: host.display(&value),
                kind: host.kind(&value),
                variables_reference,
            });
        }
        Ok(variables)
    }
}
