//! Logical lines and content normalization.
//!
//! Callers hand the engine `Content`: strings, `LogicalLine`s, `SharedLine`s
//! or lists of them. Owned text with embedded line breaks is split at
//! ingestion, each piece inheriting `indent` and `force`.
//!
//! `SharedLine` supports the update-by-reference pattern: application tasks
//! keep a handle and mutate the line between renders. The engine never
//! observes mutations reactively. It takes a snapshot at every
//! update / append / render / spinner tick boundary; anything written between
//! two boundaries becomes visible at the next one.

use crate::spinner::PLACEHOLDER;
use core_text::split_lines;
use std::sync::{Arc, RwLock};

/// Caller-supplied unwrapped text unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalLine {
    pub text: String,
    pub indent: u16,
    /// Bypass diffing and rewrite every physical row of this line.
    pub force: bool,
}

impl LogicalLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            indent: 0,
            force: false,
        }
    }

    pub fn with_indent(mut self, indent: u16) -> Self {
        self.indent = indent;
        self
    }

    pub fn forced(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn has_placeholder(&self) -> bool {
        self.text.contains(PLACEHOLDER)
    }

    /// Split embedded line breaks into sibling lines sharing indent + force.
    pub fn split(self) -> Vec<LogicalLine> {
        if !self.text.contains('\n') {
            return vec![self];
        }
        split_lines(&self.text)
            .map(|piece| LogicalLine {
                text: piece.to_string(),
                indent: self.indent,
                force: self.force,
            })
            .collect()
    }
}

impl From<&str> for LogicalLine {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for LogicalLine {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Logical line shared by reference between application tasks and the engine.
#[derive(Debug, Clone, Default)]
pub struct SharedLine(Arc<RwLock<LogicalLine>>);

impl SharedLine {
    pub fn new(line: impl Into<LogicalLine>) -> Self {
        Self(Arc::new(RwLock::new(line.into())))
    }

    /// Mutate the line in place. Visible to the engine at its next snapshot.
    pub fn update<F: FnOnce(&mut LogicalLine)>(&self, f: F) {
        let mut guard = self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard);
    }

    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|line| line.text = text);
    }

    pub fn snapshot(&self) -> LogicalLine {
        self.0
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// One entry of the engine's next-frame list.
#[derive(Debug, Clone)]
pub enum LineSource {
    Owned(LogicalLine),
    Shared(SharedLine),
}

impl LineSource {
    fn snapshot_into(&self, out: &mut Vec<LogicalLine>) {
        match self {
            LineSource::Owned(line) => out.push(line.clone()),
            LineSource::Shared(shared) => out.extend(shared.snapshot().split()),
        }
    }
}

/// Normalized input for `update` / `append`.
#[derive(Debug, Clone, Default)]
pub struct Content(Vec<LineSource>);

impl Content {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: impl Into<Content>) {
        self.0.extend(item.into().0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sources(&self) -> &[LineSource] {
        &self.0
    }

    pub fn into_sources(self) -> Vec<LineSource> {
        self.0
    }

    /// Point-in-time copy of every line, shared lines included.
    pub fn snapshot(&self) -> Vec<LogicalLine> {
        snapshot(&self.0)
    }
}

/// Snapshot a list of sources into plain logical lines.
pub fn snapshot(sources: &[LineSource]) -> Vec<LogicalLine> {
    let mut out = Vec::with_capacity(sources.len());
    for source in sources {
        source.snapshot_into(&mut out);
    }
    out
}

impl From<LogicalLine> for Content {
    fn from(line: LogicalLine) -> Self {
        Self(line.split().into_iter().map(LineSource::Owned).collect())
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        LogicalLine::new(text).into()
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        LogicalLine::new(text).into()
    }
}

impl From<SharedLine> for Content {
    fn from(line: SharedLine) -> Self {
        Self(vec![LineSource::Shared(line)])
    }
}

impl From<&SharedLine> for Content {
    fn from(line: &SharedLine) -> Self {
        line.clone().into()
    }
}

impl<T: Into<Content>> From<Vec<T>> for Content {
    fn from(items: Vec<T>) -> Self {
        let mut content = Content::new();
        for item in items {
            content.push(item);
        }
        content
    }
}

impl<T: Into<Content>, const N: usize> From<[T; N]> for Content {
    fn from(items: [T; N]) -> Self {
        let mut content = Content::new();
        for item in items {
            content.push(item);
        }
        content
    }
}
