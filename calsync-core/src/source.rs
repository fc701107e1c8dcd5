//! Contracts between the reconciliation engine and its collaborators.

use chrono::{DateTime, Utc};

use crate::error::SyncResult;
use crate::event::{Event, Side};

/// The window a pass looks at: events ending at or after `from`.
///
/// Captured once per pass so both snapshots and the retirement check agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub from: DateTime<Utc>,
}

impl SyncWindow {
    pub fn starting_now() -> Self {
        SyncWindow { from: Utc::now() }
    }

    /// Whether `event` ended before the window opened.
    pub fn has_passed(&self, event: &Event) -> bool {
        event.end < self.from
    }
}

/// One external event source: snapshots plus mutations.
///
/// Implementations return events already normalized, with the synthetic
/// identifier decoded from the source's private attribute.
#[allow(async_fn_in_trait)]
pub trait EventSource {
    fn side(&self) -> Side;

    async fn list_upcoming(&self, window: &SyncWindow) -> SyncResult<Vec<Event>>;

    /// Create `event` and return the source's native id for it.
    async fn create(&self, event: &Event) -> SyncResult<String>;

    /// Overwrite the source's copy of `event`, addressed by its native id.
    async fn update(&self, event: &Event) -> SyncResult<()>;

    async fn delete(&self, event: &Event) -> SyncResult<()>;
}

/// Durable keyed store of canonical events.
#[allow(async_fn_in_trait)]
pub trait EventStore {
    async fn list_all(&self) -> SyncResult<Vec<Event>>;

    /// `Ok(None)` when no record exists under `id`.
    async fn get(&self, id: &str) -> SyncResult<Option<Event>>;

    /// Create or overwrite the record keyed by the event's synthetic id.
    async fn put(&self, event: &Event) -> SyncResult<()>;

    async fn remove(&self, id: &str) -> SyncResult<()>;
}
