//! Error types for calsync.

use std::fmt;

use thiserror::Error;

use crate::event::Side;
use crate::reconcile::Phase;

/// Where a read or write was aimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Tasks,
    Schedule,
    Store,
}

impl From<Side> for Target {
    fn from(side: Side) -> Self {
        match side {
            Side::Tasks => Target::Tasks,
            Side::Schedule => Target::Schedule,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Tasks => write!(f, "tasks"),
            Target::Schedule => write!(f, "schedule"),
            Target::Store => write!(f, "store"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    AssignId,
    Create,
    Update,
    Delete,
    Put,
    Remove,
}

/// One mutation step of a pass, e.g. "create in schedule".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub op: Op,
    pub target: Target,
}

impl Step {
    pub fn new(op: Op, target: impl Into<Target>) -> Self {
        Step {
            op,
            target: target.into(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Op::AssignId => write!(f, "assign identifier"),
            Op::Create => write!(f, "create in {}", self.target),
            Op::Update => write!(f, "update in {}", self.target),
            Op::Delete => write!(f, "delete from {}", self.target),
            Op::Put => write!(f, "write to {}", self.target),
            Op::Remove => write!(f, "remove from {}", self.target),
        }
    }
}

/// Errors that can occur in calsync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Could not generate identifier: {0}")]
    Identity(String),

    #[error("Failed to list events from {target}: {source}")]
    Fetch {
        target: Target,
        #[source]
        source: Box<SyncError>,
    },

    #[error("Failed to {step} for event '{event}': {source}")]
    Write {
        step: Step,
        event: String,
        #[source]
        source: Box<SyncError>,
    },

    #[error("Sync pass aborted during {phase}: {source}")]
    Aborted {
        phase: Phase,
        #[source]
        source: Box<SyncError>,
    },

    #[error("Sync pass exceeded its deadline of {0}s")]
    Deadline(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SyncError {
    pub fn fetch(target: impl Into<Target>, source: SyncError) -> Self {
        SyncError::Fetch {
            target: target.into(),
            source: Box::new(source),
        }
    }

    pub fn write(step: Step, event: &str, source: SyncError) -> Self {
        SyncError::Write {
            step,
            event: event.to_string(),
            source: Box::new(source),
        }
    }

    pub fn aborted(phase: Phase, source: SyncError) -> Self {
        SyncError::Aborted {
            phase,
            source: Box::new(source),
        }
    }
}

/// Result type alias for calsync operations.
pub type SyncResult<T> = Result<T, SyncError>;
