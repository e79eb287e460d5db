//! Per-file breakpoint sets and the dirty counter used to invalidate
//! breakpoint caches compiled by the interpreter.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A breakpoint position as sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceBreakpoint {
    /// Line (1-based).
    pub line: u32,
    /// Optional column; `None` matches any column on the line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl SourceBreakpoint {
    /// A whole-line breakpoint.
    pub fn line(line: u32) -> Self {
        Self { line, column: None }
    }

    /// A breakpoint on one column of a line.
    pub fn at(line: u32, column: u32) -> Self {
        Self {
            line,
            column: Some(column),
        }
    }
}

/// The breakpoints registered for one file, ordered by line then column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakpointSet {
    positions: BTreeSet<SourceBreakpoint>,
}

impl BreakpointSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct breakpoints.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the set holds no breakpoints.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Whether a breakpoint covers `(line, column)`.
    pub fn contains(&self, line: u32, column: u32) -> bool {
        self.positions
            .range(SourceBreakpoint::line(line)..=SourceBreakpoint::at(line, u32::MAX))
            .any(|bp| bp.column.map_or(true, |c| c == column))
    }

    /// Distinct lines that carry at least one breakpoint.
    pub fn lines(&self) -> BTreeSet<u32> {
        self.positions.iter().map(|bp| bp.line).collect()
    }
}

impl FromIterator<SourceBreakpoint> for BreakpointSet {
    fn from_iter<I: IntoIterator<Item = SourceBreakpoint>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

/// A file's breakpoints together with the dirty-counter value they were
/// registered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBreakpoints {
    /// The registered breakpoints.
    pub breakpoints: BreakpointSet,
    /// Dirty-counter value at registration time.
    pub dirty: u64,
}

/// Breakpoints for every file, plus a monotonically increasing dirty
/// counter.
///
/// The counter is the single source of truth for cache invalidation: any
/// interpreter-side cache built at an older counter value must be rebuilt.
#[derive(Debug, Clone, Default)]
pub struct BreakpointStore {
    files: BTreeMap<String, FileBreakpoints>,
    dirty_counter: u64,
}

impl BreakpointStore {
    /// Create an empty store with the counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the breakpoints for `path` and bump the dirty counter.
    ///
    /// The old set is discarded even when equal to the new one.
    pub fn set(&mut self, path: impl Into<String>, breakpoints: BreakpointSet) {
        let path = path.into();
        tracing::debug!(
            path = %path,
            count = breakpoints.len(),
            dirty = self.dirty_counter,
            "breakpoints replaced"
        );
        self.files.insert(
            path,
            FileBreakpoints {
                breakpoints,
                dirty: self.dirty_counter,
            },
        );
        self.dirty_counter += 1;
    }

    /// Breakpoints registered for `path`, if any.
    pub fn get(&self, path: &str) -> Option<&FileBreakpoints> {
        self.files.get(path)
    }

    /// Current dirty-counter value.
    pub fn dirty_counter(&self) -> u64 {
        self.dirty_counter
    }

    /// Force every compiled breakpoint cache to be rebuilt.
    pub fn invalidate(&mut self) {
        self.dirty_counter += 1;
    }

    /// Drop every file's breakpoints. The counter is left untouched.
    pub fn clear(&mut self) {
        self.files.clear();
    }
}
