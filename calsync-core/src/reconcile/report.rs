//! What a pass did (or would do), and what failed.

use std::fmt;

use crate::error::{Step, SyncError, Target};
use crate::event::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
    /// Dropped from the store after leaving the sync window; nothing propagated
    Retire,
}

impl ChangeKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ChangeKind::Create => "+",
            ChangeKind::Update => "~",
            ChangeKind::Delete => "-",
            ChangeKind::Retire => "x",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A single mutation applied to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    pub target: Target,
    pub event_id: String,
    pub title: String,
}

impl Change {
    pub fn new(kind: ChangeKind, target: impl Into<Target>, event: &Event) -> Self {
        Change {
            kind,
            target: target.into(),
            event_id: event.label().to_string(),
            title: event.title.clone(),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.kind, self.title, self.target)
    }
}

/// An event whose processing was abandoned for this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub event_id: String,
    pub title: String,
    pub step: Option<Step>,
    pub error: String,
}

impl Failure {
    pub fn new(event: &Event, error: &SyncError) -> Self {
        let (step, error) = match error {
            SyncError::Write { step, source, .. } => (Some(*step), source.to_string()),
            other => (None, other.to_string()),
        };
        Failure {
            event_id: event.label().to_string(),
            title: event.title.clone(),
            step,
            error,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            Some(step) => write!(
                f,
                "{} ({}): failed to {}: {}",
                self.title, self.event_id, step, self.error
            ),
            None => write!(f, "{} ({}): {}", self.title, self.event_id, self.error),
        }
    }
}

/// Outcome of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub changes: Vec<Change>,
    pub failures: Vec<Failure>,
}

impl PassReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.failures.is_empty()
    }

    /// (created, updated, deleted) against `target`.
    pub fn counts(&self, target: Target) -> (usize, usize, usize) {
        let mut created = 0;
        let mut updated = 0;
        let mut deleted = 0;

        for change in self.changes.iter().filter(|c| c.target == target) {
            match change.kind {
                ChangeKind::Create => created += 1,
                ChangeKind::Update => updated += 1,
                ChangeKind::Delete | ChangeKind::Retire => deleted += 1,
            }
        }

        (created, updated, deleted)
    }

    pub fn merge(&mut self, other: PassReport) {
        self.changes.extend(other.changes);
        self.failures.extend(other.failures);
    }
}
