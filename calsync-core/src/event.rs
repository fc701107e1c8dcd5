//! Source-neutral event type.
//!
//! Providers convert their API responses into `RemoteEvent`s (see `remote::protocol`),
//! which are normalized into this type before reaching the reconciliation engine.
//! The same shape is persisted in the reconciliation store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two external event sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The task/database-backed calendar. Sole authority for color.
    Tasks,
    /// The scheduling-calendar service.
    Schedule,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Tasks => Side::Schedule,
            Side::Schedule => Side::Tasks,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Tasks => write!(f, "tasks"),
            Side::Schedule => write!(f, "schedule"),
        }
    }
}

/// A calendar event as seen by the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Synthetic identifier joining the three views. `None` until first tracked.
    pub id: Option<String>,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    #[serde(default)]
    pub description: String,
    pub color: Option<String>,

    // Administrative fields, ignored when comparing content
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    /// Native identifier on the tasks side
    pub tasks_id: Option<String>,
    /// Native identifier on the schedule side
    pub schedule_id: Option<String>,
}

impl Event {
    pub fn is_tracked(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_materialized(&self) -> bool {
        self.is_tracked() && self.tasks_id.is_some() && self.schedule_id.is_some()
    }

    pub fn native_id(&self, side: Side) -> Option<&str> {
        match side {
            Side::Tasks => self.tasks_id.as_deref(),
            Side::Schedule => self.schedule_id.as_deref(),
        }
    }

    pub fn set_native_id(&mut self, side: Side, native_id: String) {
        match side {
            Side::Tasks => self.tasks_id = Some(native_id),
            Side::Schedule => self.schedule_id = Some(native_id),
        }
    }

    /// Identifier used in logs and reports: the synthetic id, else a native id.
    pub fn label(&self) -> &str {
        self.id
            .as_deref()
            .or(self.tasks_id.as_deref())
            .or(self.schedule_id.as_deref())
            .unwrap_or("<unidentified>")
    }

    /// Whether `observed` (as read from `side`) carries different content than `self`.
    ///
    /// Created/updated times and native ids never count. Color counts only for the
    /// tasks side, since the schedule side has no authoritative color.
    pub fn differs_from(&self, observed: &Event, side: Side) -> bool {
        self.id != observed.id
            || self.title != observed.title
            || self.start != observed.start
            || self.end != observed.end
            || self.all_day != observed.all_day
            || self.description != observed.description
            || (side == Side::Tasks && self.color != observed.color)
    }

    /// Build a new record from `self` with `winner`'s content fields.
    ///
    /// Identity, native ids and created time stay as in `self`. Color is taken from
    /// `winner` only when `color_from` is set; callers pass the tasks-side version there.
    pub fn merged_with(&self, winner: &Event, color_from: Option<&Event>) -> Event {
        Event {
            title: winner.title.clone(),
            start: winner.start,
            end: winner.end,
            all_day: winner.all_day,
            description: winner.description.clone(),
            color: color_from.map_or_else(|| self.color.clone(), |e| e.color.clone()),
            updated: winner.updated.or(self.updated),
            ..self.clone()
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
