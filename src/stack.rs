use std::fmt;

use crate::ast::Position;
use crate::error::{TagupError, TagupResult};

const ROOT_NAME: &str = "ROOT";

/// One in-progress tag expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry {
    pub name: String,
    pub position: Option<Position>,
}

impl StackEntry {
    pub fn new(name: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    fn root() -> Self {
        Self::new(ROOT_NAME, None)
    }

    pub fn is_root(&self) -> bool {
        self.position.is_none() && self.name == ROOT_NAME
    }
}

impl fmt::Display for StackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{position} -> {}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Independent snapshot of a [`TagStack`], ROOT first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackTrace(Vec<StackEntry>);

impl StackTrace {
    /// Trace holding only the ROOT entry.
    pub fn root() -> Self {
        Self(vec![StackEntry::root()])
    }

    pub fn entries(&self) -> &[StackEntry] {
        &self.0
    }

    /// Extend the snapshot with a final entry naming the failing reference.
    pub(crate) fn pointing_at(mut self, name: impl Into<String>, position: Position) -> Self {
        self.0.push(StackEntry::new(name, Some(position)));
        self
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_entries(f, &self.0)
    }
}

fn write_entries(f: &mut fmt::Formatter<'_>, entries: &[StackEntry]) -> fmt::Result {
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            f.write_str(" -> ")?;
        }
        write!(f, "{entry}")?;
    }
    Ok(())
}

/// Stack of tag expansions with a fixed capacity of `max_depth + 1` entries,
/// counting the ROOT sentinel.
#[derive(Debug, Clone)]
pub struct TagStack {
    entries: Vec<StackEntry>,
    capacity: usize,
}

impl TagStack {
    pub fn new(max_depth: usize) -> Self {
        let capacity = max_depth.saturating_add(1);
        let mut entries = Vec::with_capacity(capacity.min(64));
        entries.push(StackEntry::root());
        Self { entries, capacity }
    }

    /// Push an expansion. On overflow the stack is left unchanged and the
    /// error's message and trace include the rejected entry.
    pub fn push(&mut self, name: &str, position: Option<Position>) -> TagupResult<()> {
        self.entries.push(StackEntry::new(name, position));
        if self.entries.len() > self.capacity {
            let err = TagupError::StackOverflow {
                message: self.to_string(),
                trace: self.stack_trace(),
            };
            self.entries.pop();
            return Err(err);
        }
        Ok(())
    }

    pub fn pop(&mut self) -> TagupResult<()> {
        if self.entries.len() <= 1 {
            return Err(TagupError::StackUnderflow {
                message: "pop from empty stack".to_string(),
                trace: self.stack_trace(),
            });
        }
        self.entries.pop();
        Ok(())
    }

    pub fn stack_trace(&self) -> StackTrace {
        StackTrace(self.entries.clone())
    }

    /// Number of expansions in progress, excluding ROOT.
    pub fn depth(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl fmt::Display for TagStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_entries(f, &self.entries)
    }
}
